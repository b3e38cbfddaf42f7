//! Supersession chain resolution.
//!
//! Given a part number, rebuild the chain of parts that replaced it, oldest
//! first, using the catalog lookup service:
//! - `normalize` canonicalizes part numbers for comparison and cache keys
//! - `cache` memoizes resolved chains per (brand, part number) for a TTL
//! - `resolver` walks `replaced_by` links as a lazy stream of steps
//! - `session` runs cache-first resolutions and drops results of superseded sessions

pub mod cache;
pub mod normalize;
pub mod resolver;
pub mod session;
pub mod types;

pub use cache::{ChainCache, FALLBACK_BRAND};
pub use resolver::{ChainResolver, MAX_STEPS};
pub use session::{ResolveRequest, SessionController};
pub use types::{CacheSource, ChainEntry, ChainSnapshot};
