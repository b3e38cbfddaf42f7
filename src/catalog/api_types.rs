//! Serde-deserializable types matching the catalog search endpoint.

use serde::Deserialize;

use super::types::PartRecord;

/// Envelope returned by `GET /parts/search`.
///
/// `success = false` and an empty `data` array both mean "not found".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub data: Vec<PartRecord>,
}

impl LookupResponse {
  #[allow(dead_code)]
  pub fn found(data: Vec<PartRecord>) -> Self {
    Self {
      success: true,
      data,
    }
  }

  /// Records usable by the resolver, or `None` when the service found nothing.
  pub fn into_matches(self) -> Option<Vec<PartRecord>> {
    if self.success && !self.data.is_empty() {
      Some(self.data)
    } else {
      None
    }
  }
}
