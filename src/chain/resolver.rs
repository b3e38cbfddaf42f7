//! Supersession chain traversal.
//!
//! The resolver walks `replaced_by` links one lookup at a time and yields each
//! part as soon as it is known. The stream ends when a terminal part is found,
//! a key repeats, the lookup service fails, or the step ceiling is reached.
//! Only a lookup failure produces an explicit [`ResolveStep::Incomplete`];
//! for the other early exits the caller sees a last record that is not
//! complete.

use futures::stream::{self, Stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::{LookupScope, PartLookup, PartRecord};

use super::normalize::normalize;
use super::types::{ResolveStep, ResolvedChain};

/// Upper bound on lookups per resolution.
pub const MAX_STEPS: usize = 10;

/// Builds supersession chains against a part lookup service.
#[derive(Clone)]
pub struct ChainResolver {
  lookup: Arc<dyn PartLookup>,
  max_steps: usize,
}

impl ChainResolver {
  pub fn new(lookup: Arc<dyn PartLookup>) -> Self {
    Self {
      lookup,
      max_steps: MAX_STEPS,
    }
  }

  /// Override the lookup ceiling.
  pub fn with_max_steps(mut self, max_steps: usize) -> Self {
    self.max_steps = max_steps;
    self
  }

  /// Lazily resolve the chain starting at `start_part_number`.
  ///
  /// When `start_record` is given it is yielded first and traversal continues
  /// from its successor; otherwise the starting part itself is looked up.
  /// Each call returns an independent traversal.
  pub fn resolve(
    &self,
    start_part_number: &str,
    start_record: Option<PartRecord>,
    scope: LookupScope,
  ) -> impl Stream<Item = ResolveStep> + Send + 'static {
    let traversal = Traversal::new(
      Arc::clone(&self.lookup),
      self.max_steps,
      start_part_number,
      start_record,
      scope,
    );

    stream::unfold(traversal, |mut traversal| async move {
      let step = traversal.advance().await?;
      Some((step, traversal))
    })
  }

  /// Drive a traversal to the end and collect the chain.
  #[allow(dead_code)]
  pub async fn resolve_all(
    &self,
    start_part_number: &str,
    start_record: Option<PartRecord>,
    scope: LookupScope,
  ) -> ResolvedChain {
    let mut records = Vec::new();
    let mut complete = false;

    let steps = self.resolve(start_part_number, start_record, scope);
    futures::pin_mut!(steps);
    while let Some(step) = steps.next().await {
      match step {
        ResolveStep::Record {
          record,
          complete: terminal,
        } => {
          records.push(record);
          complete = terminal;
        }
        ResolveStep::Incomplete => complete = false,
      }
    }

    ResolvedChain::from_records(records, complete)
  }
}

/// Traversal state carried between yielded steps.
struct Traversal {
  lookup: Arc<dyn PartLookup>,
  scope: LookupScope,
  max_steps: usize,
  /// Normalized keys already looked up (plus the start record's)
  visited: HashSet<String>,
  /// Normalized part number of the caller-supplied start record
  start_key: Option<String>,
  /// Start record not yet yielded
  pending_start: Option<PartRecord>,
  next_key: Option<String>,
  steps: usize,
  done: bool,
}

impl Traversal {
  fn new(
    lookup: Arc<dyn PartLookup>,
    max_steps: usize,
    start_part_number: &str,
    start_record: Option<PartRecord>,
    scope: LookupScope,
  ) -> Self {
    let mut visited = HashSet::new();
    let (start_key, next_key) = match &start_record {
      Some(start) => {
        let key = normalize(&start.part_number);
        visited.insert(key.clone());
        (Some(key), start.successor().map(normalize))
      }
      None => (None, Some(normalize(start_part_number))),
    };

    Self {
      lookup,
      scope,
      max_steps,
      visited,
      start_key,
      pending_start: start_record,
      next_key,
      steps: 0,
      done: false,
    }
  }

  fn finish(&mut self) -> Option<ResolveStep> {
    self.done = true;
    None
  }

  async fn advance(&mut self) -> Option<ResolveStep> {
    if self.done {
      return None;
    }

    if let Some(start) = self.pending_start.take() {
      let complete = start.is_terminal();
      if complete {
        self.done = true;
      }
      return Some(ResolveStep::Record {
        record: start,
        complete,
      });
    }

    loop {
      let key = match self.next_key.take() {
        Some(key) if !key.is_empty() => key,
        _ => return self.finish(),
      };

      if self.visited.contains(&key) {
        warn!(%key, "supersession cycle, stopping");
        return self.finish();
      }
      if self.steps >= self.max_steps {
        warn!(%key, max_steps = self.max_steps, "step ceiling reached, stopping");
        return self.finish();
      }

      self.visited.insert(key.clone());
      self.steps += 1;
      debug!(%key, step = self.steps, "looking up part");

      let matches = match self.lookup.search(&key, self.scope).await {
        Ok(response) => response.into_matches(),
        Err(e) => {
          warn!(%key, error = %e, "part lookup failed");
          None
        }
      };

      let record = match matches.and_then(|records| select_match(records, &key)) {
        Some(record) => record,
        None => {
          debug!(%key, "no match, chain truncated");
          self.done = true;
          return Some(ResolveStep::Incomplete);
        }
      };

      // The first lookup may echo the start record back; don't list it twice.
      if self.steps == 1 && self.start_key.as_deref() == Some(normalize(&record.part_number).as_str())
      {
        debug!(%key, "lookup returned the start record, skipping");
        self.next_key = record.successor().map(normalize);
        continue;
      }

      let complete = record.is_terminal();
      if complete {
        self.done = true;
      } else {
        self.next_key = record.successor().map(normalize);
      }
      return Some(ResolveStep::Record { record, complete });
    }
  }
}

/// Pick the record whose normalized part number equals `key`, falling back
/// to the first record for fuzzy responses.
fn select_match(records: Vec<PartRecord>, key: &str) -> Option<PartRecord> {
  let exact = records
    .iter()
    .position(|record| normalize(&record.part_number) == key)
    .unwrap_or(0);
  records.into_iter().nth(exact)
}
