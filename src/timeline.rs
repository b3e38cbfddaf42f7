//! Plain-text rendering of chain snapshots.

use crate::chain::{CacheSource, ChainEntry, ChainSnapshot};

/// Render a snapshot as a block of text, one line per part.
///
/// Rendering depends only on the snapshot, so the same chain delivered twice
/// renders identically.
pub fn render(snapshot: &ChainSnapshot) -> String {
  let mut out = String::new();

  let state = if snapshot.resolving {
    "resolving..."
  } else if snapshot.incomplete {
    "incomplete"
  } else {
    "complete"
  };
  let source = match snapshot.source {
    CacheSource::Network => "",
    CacheSource::Cache => " (cached)",
  };
  out.push_str(&format!("[session {}] {}{}\n", snapshot.session, state, source));

  if snapshot.chain.is_empty() {
    out.push_str("  (no parts found)\n");
  }
  for entry in &snapshot.chain {
    out.push_str(&render_entry(entry));
    out.push('\n');
  }

  if !snapshot.resolving && snapshot.incomplete && !snapshot.chain.is_empty() {
    out.push_str("  ... chain may continue\n");
  }

  out
}

fn render_entry(entry: &ChainEntry) -> String {
  let record = &entry.record;
  let mut line = format!("  {:>2}. {}", entry.position, record.part_number);
  if !record.brand.is_empty() {
    line.push_str(&format!(" [{}]", record.brand));
  }
  if !record.description.is_empty() {
    line.push_str(&format!(" {}", record.description));
  }
  if !record.status.is_empty() {
    line.push_str(&format!(" ({})", record.status));
  }
  if let Some(supplier) = &record.supplier_name {
    line.push_str(&format!(" @ {}", supplier));
  }
  if let Some(next) = record.successor() {
    line.push_str(&format!(" -> {}", next.trim()));
  }
  line
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::lookup::fake::part;
  use crate::chain::types::ResolvedChain;

  fn snapshot(resolving: bool, incomplete: bool, source: CacheSource) -> ChainSnapshot {
    let chain = ResolvedChain::from_records(vec![part("A", "B"), part("B", "")], !incomplete);
    ChainSnapshot {
      session: 3,
      chain: chain.entries,
      resolving,
      incomplete,
      source,
    }
  }

  #[test]
  fn test_render_complete_chain() {
    let text = render(&snapshot(false, false, CacheSource::Network));
    assert_eq!(
      text,
      "[session 3] complete\n   0. A [FEBI] Part A (normal) -> B\n   1. B [FEBI] Part B (normal)\n"
    );
  }

  #[test]
  fn test_render_incomplete_and_cached() {
    let text = render(&snapshot(false, true, CacheSource::Cache));
    assert!(text.starts_with("[session 3] incomplete (cached)\n"));
    assert!(text.ends_with("  ... chain may continue\n"));
  }

  #[test]
  fn test_render_is_idempotent() {
    let s = snapshot(true, false, CacheSource::Network);
    assert_eq!(render(&s), render(&s.clone()));
  }

  #[test]
  fn test_render_empty_chain() {
    let s = ChainSnapshot {
      session: 1,
      chain: Vec::new(),
      resolving: false,
      incomplete: true,
      source: CacheSource::Network,
    };
    assert_eq!(render(&s), "[session 1] incomplete\n  (no parts found)\n");
  }
}
