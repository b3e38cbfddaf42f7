//! Keyed in-memory storage for cached values.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// A single cached value.
#[derive(Debug, Clone)]
pub struct CachedEntry<T> {
  /// The cached value
  pub value: T,
  /// When the value was stored
  pub cached_at: DateTime<Utc>,
}

/// Mutex-guarded map of cache entries.
///
/// Writes replace the whole entry, so readers never observe a partially
/// written value. Concurrent writers to one key are last-writer-wins.
#[derive(Debug)]
pub struct MemoryStorage<T> {
  entries: Mutex<HashMap<String, CachedEntry<T>>>,
}

impl<T: Clone> MemoryStorage<T> {
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
    }
  }

  /// Copy of the entry stored under `key`, regardless of age.
  pub fn get(&self, key: &str) -> Option<CachedEntry<T>> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }

  /// Store `value` under `key`, replacing any existing entry.
  pub fn put(&self, key: &str, value: T, cached_at: DateTime<Utc>) {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_string(), CachedEntry { value, cached_at });
  }

  #[allow(dead_code)]
  pub fn len(&self) -> usize {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }
}

impl<T: Clone> Default for MemoryStorage<T> {
  fn default() -> Self {
    Self::new()
  }
}
