use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Snapshot of one catalog part as returned by the lookup service.
///
/// A record with an empty `replaced_by` is terminal: it is the latest part in
/// its chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRecord {
  pub part_number: String,
  #[serde(default)]
  pub brand: String,
  #[serde(default)]
  pub description: String,
  /// Free-form classification, e.g. "normal" or "no longer supplied"
  #[serde(default)]
  pub status: String,
  /// Next part number in the chain
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub replaced_by: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub supplier_name: Option<String>,
}

impl PartRecord {
  /// The successor part number, if the record names a non-blank one.
  pub fn successor(&self) -> Option<&str> {
    self
      .replaced_by
      .as_deref()
      .filter(|next| !next.trim().is_empty())
  }

  pub fn is_terminal(&self) -> bool {
    self.successor().is_none()
  }
}

/// Audience tier the lookup service answers for.
///
/// Only affects what the service is allowed to return, never how a chain is
/// walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupScope {
  /// Retail catalog
  #[default]
  Public,
  /// Trade accounts; may see internal and discontinued references
  Partner,
}

impl LookupScope {
  pub fn as_str(&self) -> &'static str {
    match self {
      LookupScope::Public => "public",
      LookupScope::Partner => "partner",
    }
  }
}

impl fmt::Display for LookupScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LookupScope {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "public" => Ok(LookupScope::Public),
      "partner" => Ok(LookupScope::Partner),
      other => Err(format!("unknown lookup scope: {}", other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_blank_successor_is_terminal() {
    let mut record = PartRecord {
      part_number: "316.699".to_string(),
      ..Default::default()
    };
    assert!(record.is_terminal());

    record.replaced_by = Some("   ".to_string());
    assert!(record.is_terminal());

    record.replaced_by = Some("316.700".to_string());
    assert_eq!(record.successor(), Some("316.700"));
    assert!(!record.is_terminal());
  }

  #[test]
  fn test_record_wire_names() {
    let json = r#"{
      "partNumber": "316.699",
      "brand": "FEBI",
      "description": "Oil filter",
      "status": "no longer supplied",
      "replacedBy": "316.700",
      "supplierName": "North Depot"
    }"#;

    let record: PartRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.part_number, "316.699");
    assert_eq!(record.replaced_by.as_deref(), Some("316.700"));
    assert_eq!(record.supplier_name.as_deref(), Some("North Depot"));
    assert_eq!(record.image_url, None);
  }

  #[test]
  fn test_scope_parse() {
    assert_eq!("Partner".parse::<LookupScope>(), Ok(LookupScope::Partner));
    assert_eq!(" public ".parse::<LookupScope>(), Ok(LookupScope::Public));
    assert!("admin".parse::<LookupScope>().is_err());
  }
}
