/// Canonical form of a part identifier.
///
/// Strips all whitespace and upper-cases the rest. Two part numbers name the
/// same part iff their normalized forms are equal.
pub fn normalize(raw: &str) -> String {
  raw
    .chars()
    .filter(|c| !c.is_whitespace())
    .flat_map(char::to_uppercase)
    .collect()
}
