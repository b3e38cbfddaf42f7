//! The part lookup seam consumed by the chain resolver.

use async_trait::async_trait;
use color_eyre::Result;

use super::api_types::LookupResponse;
use super::types::LookupScope;

/// A service that returns part records for a search key.
///
/// The service may answer with fuzzy matches, so the records returned are
/// not guaranteed to carry the exact key that was asked for.
#[async_trait]
pub trait PartLookup: Send + Sync {
  async fn search(&self, key: &str, scope: LookupScope) -> Result<LookupResponse>;
}
