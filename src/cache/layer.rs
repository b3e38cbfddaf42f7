//! Cache layer that applies TTL freshness on top of the storage.

use chrono::Duration;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::storage::{CachedEntry, MemoryStorage};

/// Time-bounded memoization store.
///
/// Entries older than the TTL are treated as absent on read. They are left
/// in storage until overwritten.
pub struct CacheLayer<T> {
  storage: Arc<MemoryStorage<T>>,
  clock: Arc<dyn Clock>,
  /// How long before cached data is considered stale
  ttl: Duration,
}

impl<T: Clone> CacheLayer<T> {
  /// Create a new cache layer on the wall clock.
  pub fn new(ttl: Duration) -> Self {
    Self::with_clock(ttl, Arc::new(SystemClock))
  }

  /// Create a new cache layer reading time from `clock`.
  pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
    Self {
      storage: Arc::new(MemoryStorage::new()),
      clock,
      ttl,
    }
  }

  fn is_fresh(&self, entry: &CachedEntry<T>) -> bool {
    self.clock.now() - entry.cached_at < self.ttl
  }

  /// Fresh entry for `key`, or `None` on a miss or a stale entry.
  pub fn get(&self, key: &str) -> Option<CachedEntry<T>> {
    self.storage.get(key).filter(|entry| self.is_fresh(entry))
  }

  /// Unconditionally store `value` stamped with the current time.
  pub fn set(&self, key: &str, value: T) {
    self.storage.put(key, value, self.clock.now());
  }

  /// Number of stored entries, including stale ones.
  #[allow(dead_code)]
  pub fn stored(&self) -> usize {
    self.storage.len()
  }
}

impl<T> Clone for CacheLayer<T> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      clock: Arc::clone(&self.clock),
      ttl: self.ttl,
    }
  }
}
