//! Generic in-process caching layer.
//!
//! This module provides a domain-agnostic, time-bounded memoization store:
//! - Entries are keyed by string and stamped with the time they were stored
//! - Expiry is lazy: an entry older than the TTL reads as a miss but is not removed
//! - Time comes from an injectable `Clock` so expiry can be tested without sleeping

mod clock;
mod layer;
mod storage;

pub use clock::Clock;
pub use layer::CacheLayer;

#[cfg(test)]
pub use clock::ManualClock;
