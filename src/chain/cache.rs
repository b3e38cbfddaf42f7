//! Chain cache keyed by brand and normalized part number.

use chrono::Duration;
use std::sync::Arc;

use crate::cache::{CacheLayer, Clock};

use super::normalize::normalize;
use super::types::ResolvedChain;

/// Bucket shared by all lookups that carry no brand.
pub const FALLBACK_BRAND: &str = "GENERIC";

/// Resolved chains stay fresh this long unless configured otherwise.
pub fn default_ttl() -> Duration {
  Duration::minutes(10)
}

/// Cache key for a resolved chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChainKey {
  pub brand: String,
  pub part_number: String,
}

impl ChainKey {
  pub fn new(brand: &str, part_number: &str, fallback_brand: &str) -> Self {
    let brand = brand.trim();
    Self {
      brand: if brand.is_empty() {
        fallback_brand.to_string()
      } else {
        brand.to_string()
      },
      part_number: normalize(part_number),
    }
  }

  pub fn cache_key(&self) -> String {
    format!("{}:{}", self.brand, self.part_number)
  }
}

/// Time-bounded store of resolved chains.
///
/// Callers always receive copies; the stored chain cannot be mutated through
/// a returned value.
#[derive(Clone)]
pub struct ChainCache {
  layer: CacheLayer<ResolvedChain>,
  fallback_brand: String,
}

impl ChainCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      layer: CacheLayer::new(ttl),
      fallback_brand: FALLBACK_BRAND.to_string(),
    }
  }

  pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
    Self {
      layer: CacheLayer::with_clock(ttl, clock),
      fallback_brand: FALLBACK_BRAND.to_string(),
    }
  }

  /// Use a different bucket for brand-less lookups.
  pub fn with_fallback_brand(mut self, fallback_brand: impl Into<String>) -> Self {
    self.fallback_brand = fallback_brand.into();
    self
  }

  fn key(&self, brand: &str, part_number: &str) -> String {
    ChainKey::new(brand, part_number, &self.fallback_brand).cache_key()
  }

  /// Fresh chain for the pair, if any. Stale records read as absent.
  pub fn get(&self, brand: &str, part_number: &str) -> Option<ResolvedChain> {
    self
      .layer
      .get(&self.key(brand, part_number))
      .map(|entry| entry.value)
  }

  /// Store `chain` for the pair, replacing whatever was there.
  pub fn set(&self, brand: &str, part_number: &str, chain: ResolvedChain) {
    self.layer.set(&self.key(brand, part_number), chain);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::ManualClock;
  use crate::catalog::lookup::fake::part;

  fn cache() -> (ChainCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (ChainCache::with_clock(default_ttl(), clock.clone()), clock)
  }

  #[test]
  fn test_key_format() {
    assert_eq!(
      ChainKey::new("FEBI", " 316 699 ", FALLBACK_BRAND).cache_key(),
      "FEBI:316699"
    );
    assert_eq!(
      ChainKey::new("  ", "oc90", FALLBACK_BRAND).cache_key(),
      "GENERIC:OC90"
    );
  }

  #[test]
  fn test_normalized_part_numbers_share_an_entry() {
    let (cache, _clock) = cache();
    let chain = ResolvedChain::from_records(vec![part("OC90", "")], true);
    cache.set("MAHLE", "oc 90", chain.clone());

    assert_eq!(cache.get("MAHLE", "OC90"), Some(chain));
    assert_eq!(cache.get("KNECHT", "OC90"), None);
  }

  #[test]
  fn test_brandless_lookups_share_the_fallback_bucket() {
    let (cache, _clock) = cache();
    let chain = ResolvedChain::from_records(vec![part("A", "")], true);
    cache.set("", "A", chain.clone());

    assert_eq!(cache.get(" ", "a"), Some(chain.clone()));
    assert_eq!(cache.get(FALLBACK_BRAND, "A"), Some(chain));
  }

  #[test]
  fn test_entry_expires_after_ttl() {
    let (cache, clock) = cache();
    cache.set("FEBI", "A", ResolvedChain::default());

    clock.advance(Duration::minutes(10) - Duration::seconds(1));
    assert!(cache.get("FEBI", "A").is_some());

    clock.advance(Duration::seconds(1));
    assert!(cache.get("FEBI", "A").is_none());
  }

  #[test]
  fn test_custom_fallback_brand() {
    let (cache, _clock) = cache();
    let cache = cache.with_fallback_brand("ANY");
    cache.set("", "A", ResolvedChain::default());
    assert!(cache.get("ANY", "A").is_some());
    assert!(cache.get(FALLBACK_BRAND, "A").is_none());
  }
}
