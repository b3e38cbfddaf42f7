//! Catalog data types and the part lookup service.

pub mod api_types;
pub mod client;
pub mod lookup;
pub mod types;

pub use client::CatalogClient;
pub use lookup::PartLookup;
pub use types::{LookupScope, PartRecord};
