use crate::catalog::PartRecord;

/// A part at its position in a resolved chain (0 = oldest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
  pub position: usize,
  pub record: PartRecord,
}

/// An ordered supersession chain, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedChain {
  pub entries: Vec<ChainEntry>,
  /// True iff traversal reached a terminal part
  pub complete: bool,
}

impl ResolvedChain {
  /// Build a chain from records in traversal order.
  pub fn from_records(records: impl IntoIterator<Item = PartRecord>, complete: bool) -> Self {
    let entries = records
      .into_iter()
      .enumerate()
      .map(|(position, record)| ChainEntry { position, record })
      .collect();
    Self { entries, complete }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[allow(dead_code)]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[allow(dead_code)]
  pub fn part_numbers(&self) -> Vec<&str> {
    self
      .entries
      .iter()
      .map(|e| e.record.part_number.as_str())
      .collect()
  }
}

/// One element produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveStep {
  /// The next part in the chain; `complete` is set when it is terminal
  Record { record: PartRecord, complete: bool },
  /// A lookup failed or found nothing; the chain ends here, truncated
  Incomplete,
}

/// Where a published chain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Built by a traversal in this session
  Network,
  /// Served from the chain cache
  Cache,
}

/// State handed to the timeline renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSnapshot {
  /// Session that produced this snapshot
  pub session: u64,
  pub chain: Vec<ChainEntry>,
  /// More steps may follow
  pub resolving: bool,
  /// The chain did not reach a terminal part
  pub incomplete: bool,
  pub source: CacheSource,
}
