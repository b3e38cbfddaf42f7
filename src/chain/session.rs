//! Resolution sessions with cache-first lookup and stale-result suppression.
//!
//! Every call to [`SessionController::resolve`] starts a new session and
//! makes all earlier sessions stale. A stale session keeps running until its
//! in-flight lookup returns, but nothing it produces reaches the consumer or
//! the cache after that point.

use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::catalog::{LookupScope, PartRecord};

use super::cache::ChainCache;
use super::resolver::ChainResolver;
use super::types::{CacheSource, ChainEntry, ChainSnapshot, ResolveStep, ResolvedChain};

/// What to resolve.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
  pub part_number: String,
  /// Cache bucket; defaults to the start record's brand
  pub brand: Option<String>,
  /// A record the caller already holds for the starting part
  pub start: Option<PartRecord>,
  pub scope: LookupScope,
}

impl ResolveRequest {
  pub fn new(part_number: impl Into<String>) -> Self {
    Self {
      part_number: part_number.into(),
      brand: None,
      start: None,
      scope: LookupScope::default(),
    }
  }

  /// Start from a known record instead of looking the first part up.
  #[allow(dead_code)]
  pub fn from_record(record: PartRecord) -> Self {
    Self {
      part_number: record.part_number.clone(),
      brand: None,
      start: Some(record),
      scope: LookupScope::default(),
    }
  }

  pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
    self.brand = Some(brand.into());
    self
  }

  pub fn with_scope(mut self, scope: LookupScope) -> Self {
    self.scope = scope;
    self
  }

  fn cache_brand(&self) -> &str {
    match (&self.brand, &self.start) {
      (Some(brand), _) => brand,
      (None, Some(start)) => &start.brand,
      (None, None) => "",
    }
  }
}

/// Coordinates cache, resolver and the snapshot consumer.
///
/// Clones share the session counter, so a `resolve` on any clone supersedes
/// sessions started on the others.
#[derive(Clone)]
pub struct SessionController {
  resolver: ChainResolver,
  cache: ChainCache,
  current: Arc<AtomicU64>,
  sink: mpsc::UnboundedSender<ChainSnapshot>,
}

impl SessionController {
  /// Create a controller publishing snapshots to `sink`.
  pub fn new(
    resolver: ChainResolver,
    cache: ChainCache,
    sink: mpsc::UnboundedSender<ChainSnapshot>,
  ) -> Self {
    Self {
      resolver,
      cache,
      current: Arc::new(AtomicU64::new(0)),
      sink,
    }
  }

  /// Id of the most recently started session.
  pub fn current_session(&self) -> u64 {
    self.current.load(Ordering::SeqCst)
  }

  fn is_current(&self, session: u64) -> bool {
    self.current_session() == session
  }

  /// Send a snapshot if `snapshot.session` is still current.
  fn publish(&self, snapshot: ChainSnapshot) -> bool {
    if !self.is_current(snapshot.session) {
      return false;
    }
    // Ignore send errors - the consumer may have gone away
    let _ = self.sink.send(snapshot);
    true
  }

  /// Resolve a chain, publishing snapshots as it grows.
  ///
  /// Returns the final snapshot, or `None` if a newer session started before
  /// this one finished.
  pub async fn resolve(&self, request: ResolveRequest) -> Option<ChainSnapshot> {
    let session = self.current.fetch_add(1, Ordering::SeqCst) + 1;
    let brand = request.cache_brand().to_string();
    info!(session, part = %request.part_number, brand = %brand, scope = %request.scope, "resolving chain");

    if let Some(chain) = self.cache.get(&brand, &request.part_number) {
      info!(session, len = chain.len(), "chain cache hit");
      let snapshot = ChainSnapshot {
        session,
        incomplete: !chain.complete,
        chain: chain.entries,
        resolving: false,
        source: CacheSource::Cache,
      };
      return self.publish(snapshot.clone()).then_some(snapshot);
    }

    // The resolver replays the start record as its first step; it is already
    // in the working chain.
    let mut echo_pending = request.start.is_some();
    let mut records: Vec<PartRecord> = request.start.iter().cloned().collect();
    let mut complete = false;

    let steps = self.resolver.resolve(
      &request.part_number,
      request.start.clone(),
      request.scope,
    );
    futures::pin_mut!(steps);

    while let Some(step) = steps.next().await {
      if !self.is_current(session) {
        debug!(session, "superseded, dropping result");
        return None;
      }

      match step {
        ResolveStep::Record {
          record,
          complete: terminal,
        } => {
          if !std::mem::take(&mut echo_pending) {
            records.push(record);
          }
          complete = terminal;
          self.publish(ChainSnapshot {
            session,
            chain: entries(&records),
            resolving: true,
            incomplete: false,
            source: CacheSource::Network,
          });
        }
        ResolveStep::Incomplete => {
          complete = false;
          break;
        }
      }
    }

    if !self.is_current(session) {
      debug!(session, "superseded, dropping result");
      return None;
    }

    let chain = ResolvedChain::from_records(records, complete);
    info!(session, len = chain.len(), complete, "chain resolved");
    self.cache.set(&brand, &request.part_number, chain.clone());

    let snapshot = ChainSnapshot {
      session,
      chain: chain.entries,
      resolving: false,
      incomplete: !complete,
      source: CacheSource::Network,
    };
    self.publish(snapshot.clone()).then_some(snapshot)
  }

  /// Run `resolve` on a background task.
  pub fn spawn_resolve(&self, request: ResolveRequest) -> JoinHandle<Option<ChainSnapshot>> {
    let controller = self.clone();
    tokio::spawn(async move { controller.resolve(request).await })
  }
}

fn entries(records: &[PartRecord]) -> Vec<ChainEntry> {
  records
    .iter()
    .cloned()
    .enumerate()
    .map(|(position, record)| ChainEntry { position, record })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::ManualClock;
  use crate::catalog::lookup::fake::{part, ScriptedLookup};
  use crate::chain::cache::default_ttl;
  use std::time::Duration;

  struct Harness {
    controller: SessionController,
    lookup: Arc<ScriptedLookup>,
    clock: Arc<ManualClock>,
    rx: mpsc::UnboundedReceiver<ChainSnapshot>,
  }

  fn harness(lookup: ScriptedLookup) -> Harness {
    let lookup = Arc::new(lookup);
    let clock = Arc::new(ManualClock::new());
    let cache = ChainCache::with_clock(default_ttl(), clock.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = SessionController::new(ChainResolver::new(lookup.clone()), cache, tx);
    Harness {
      controller,
      lookup,
      clock,
      rx,
    }
  }

  fn drain(rx: &mut mpsc::UnboundedReceiver<ChainSnapshot>) -> Vec<ChainSnapshot> {
    let mut out = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
      out.push(snapshot);
    }
    out
  }

  fn chain_numbers(snapshot: &ChainSnapshot) -> Vec<&str> {
    snapshot
      .chain
      .iter()
      .map(|e| e.record.part_number.as_str())
      .collect()
  }

  fn abc() -> ScriptedLookup {
    ScriptedLookup::new()
      .with("B", vec![part("B", "C")])
      .with("C", vec![part("C", "")])
  }

  #[tokio::test]
  async fn test_snapshots_grow_in_traversal_order() {
    let mut h = harness(abc());
    let last = h
      .controller
      .resolve(ResolveRequest::from_record(part("A", "B")))
      .await
      .unwrap();

    let snapshots = drain(&mut h.rx);
    let chains: Vec<Vec<&str>> = snapshots.iter().map(chain_numbers).collect();
    assert_eq!(
      chains,
      vec![
        vec!["A"],
        vec!["A", "B"],
        vec!["A", "B", "C"],
        vec!["A", "B", "C"]
      ]
    );
    assert!(snapshots[..3].iter().all(|s| s.resolving));
    assert_eq!(snapshots[3], last);
    assert!(!last.resolving);
    assert!(!last.incomplete);
    assert_eq!(last.source, CacheSource::Network);
    let positions: Vec<usize> = last.chain.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
  }

  #[tokio::test]
  async fn test_cycle_ends_incomplete() {
    let mut h = harness(ScriptedLookup::new().with("B", vec![part("B", "A")]));
    let last = h
      .controller
      .resolve(ResolveRequest::from_record(part("A", "B")))
      .await
      .unwrap();

    let chains: Vec<Vec<String>> = drain(&mut h.rx)
      .iter()
      .map(|s| chain_numbers(s).into_iter().map(String::from).collect())
      .collect();
    assert_eq!(chains[0], vec!["A"]);
    assert_eq!(chains[1], vec!["A", "B"]);
    assert_eq!(chain_numbers(&last), vec!["A", "B"]);
    assert!(last.incomplete);
  }

  #[tokio::test]
  async fn test_part_without_successor() {
    let mut h = harness(ScriptedLookup::new().with("316.699", vec![part("316.699", "")]));
    let last = h
      .controller
      .resolve(ResolveRequest::new("316.699"))
      .await
      .unwrap();

    assert_eq!(chain_numbers(&last), vec!["316.699"]);
    assert!(!last.incomplete);
    assert_eq!(drain(&mut h.rx).len(), 2);
  }

  #[tokio::test]
  async fn test_cache_hit_skips_lookups() {
    let mut h = harness(
      ScriptedLookup::new()
        .with("316.699", vec![part("316.699", "316.700")])
        .with("316.700", vec![part("316.700", "")]),
    );

    let first = h
      .controller
      .resolve(ResolveRequest::new("316.699"))
      .await
      .unwrap();
    let calls = h.lookup.calls();
    drain(&mut h.rx);

    let second = h
      .controller
      .resolve(ResolveRequest::new("316.699"))
      .await
      .unwrap();

    assert_eq!(h.lookup.calls(), calls);
    assert_eq!(second.chain, first.chain);
    assert_eq!(second.source, CacheSource::Cache);
    assert!(!second.resolving);

    let snapshots = drain(&mut h.rx);
    assert_eq!(snapshots, vec![second]);
  }

  #[tokio::test]
  async fn test_cache_key_ignores_spacing_and_case() {
    let h = harness(ScriptedLookup::new().with("OC90", vec![part("OC90", "")]));

    h.controller.resolve(ResolveRequest::new("oc 90")).await;
    let hit = h
      .controller
      .resolve(ResolveRequest::new(" OC90 "))
      .await
      .unwrap();

    assert_eq!(hit.source, CacheSource::Cache);
    assert_eq!(h.lookup.calls(), 1);
  }

  #[tokio::test]
  async fn test_expired_cache_triggers_fresh_lookup() {
    let h = harness(ScriptedLookup::new().with("316.699", vec![part("316.699", "")]));

    h.controller.resolve(ResolveRequest::new("316.699")).await;
    assert_eq!(h.lookup.calls(), 1);

    h.clock.advance(chrono::Duration::minutes(11));
    let again = h
      .controller
      .resolve(ResolveRequest::new("316.699"))
      .await
      .unwrap();

    assert_eq!(h.lookup.calls(), 2);
    assert_eq!(again.source, CacheSource::Network);
  }

  #[tokio::test]
  async fn test_brand_separates_cache_entries() {
    let h = harness(ScriptedLookup::new().with("A", vec![part("A", "")]));

    h.controller
      .resolve(ResolveRequest::new("A").with_brand("FEBI"))
      .await;
    h.controller
      .resolve(ResolveRequest::new("A").with_brand("MAHLE"))
      .await;
    let hit = h
      .controller
      .resolve(ResolveRequest::new("A").with_brand("FEBI"))
      .await
      .unwrap();

    assert_eq!(h.lookup.calls(), 2);
    assert_eq!(hit.source, CacheSource::Cache);
  }

  #[tokio::test]
  async fn test_lookup_failure_keeps_prefix_and_is_cached() {
    let mut h = harness(
      ScriptedLookup::new()
        .with("B", vec![part("B", "C")])
        .failing("C"),
    );

    let last = h
      .controller
      .resolve(ResolveRequest::from_record(part("A", "B")))
      .await
      .unwrap();
    assert_eq!(chain_numbers(&last), vec!["A", "B"]);
    assert!(last.incomplete);
    assert!(!last.resolving);
    drain(&mut h.rx);

    let hit = h
      .controller
      .resolve(ResolveRequest::from_record(part("A", "B")))
      .await
      .unwrap();
    assert_eq!(hit.source, CacheSource::Cache);
    assert!(hit.incomplete);
  }

  #[tokio::test]
  async fn test_unknown_part_yields_empty_incomplete_chain() {
    let h = harness(ScriptedLookup::new());
    let last = h
      .controller
      .resolve(ResolveRequest::new("NOPE"))
      .await
      .unwrap();

    assert!(last.chain.is_empty());
    assert!(last.incomplete);
  }

  #[tokio::test]
  async fn test_newer_session_suppresses_older_one() {
    let (lookup, release) = ScriptedLookup::new()
      .with("X", vec![part("X", "")])
      .gated("X");
    let mut h = harness(lookup);

    let stale = h.controller.spawn_resolve(ResolveRequest::new("X"));
    // Let the first session reach its lookup
    while h.lookup.calls() == 0 {
      tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let fresh = h
      .controller
      .resolve(ResolveRequest::new("X"))
      .await
      .unwrap();
    assert_eq!(fresh.session, 2);

    let mut late = part("X", "");
    late.description = "late".to_string();
    release.send(vec![late]).unwrap();

    let stale = tokio::time::timeout(Duration::from_secs(1), stale)
      .await
      .unwrap()
      .unwrap();
    assert!(stale.is_none());

    let snapshots = drain(&mut h.rx);
    assert!(!snapshots.is_empty());
    assert!(snapshots.iter().all(|s| s.session == 2));

    // The stale session must not have overwritten the cache
    let hit = h
      .controller
      .resolve(ResolveRequest::new("X"))
      .await
      .unwrap();
    assert_eq!(hit.source, CacheSource::Cache);
    assert_eq!(hit.chain[0].record.description, "Part X");
  }

  #[tokio::test]
  async fn test_session_ids_increase() {
    let h = harness(ScriptedLookup::new().with("A", vec![part("A", "")]));
    assert_eq!(h.controller.current_session(), 0);

    let a = h.controller.resolve(ResolveRequest::new("A")).await.unwrap();
    let b = h.controller.resolve(ResolveRequest::new("A")).await.unwrap();

    assert_eq!(a.session, 1);
    assert_eq!(b.session, 2);
    assert_eq!(h.controller.current_session(), 2);
  }

  #[tokio::test]
  async fn test_scope_is_passed_through() {
    let h = harness(ScriptedLookup::new().with("A", vec![part("A", "")]));
    let last = h
      .controller
      .resolve(ResolveRequest::new("A").with_scope(LookupScope::Partner))
      .await
      .unwrap();
    assert_eq!(last.chain.len(), 1);
    assert_eq!(h.lookup.scopes(), vec![LookupScope::Partner]);
  }
}
