use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use tracing::debug;
use url::Url;

use crate::config::Config;

use super::api_types::LookupResponse;
use super::lookup::PartLookup;
use super::types::LookupScope;

/// HTTP client for the catalog search endpoint
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base_url: Url,
}

impl CatalogClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&config.catalog.url)
      .map_err(|e| eyre!("Invalid catalog url {}: {}", config.catalog.url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("partchain/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create catalog client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// Build the search url for a key and scope
  fn search_url(&self, key: &str, scope: LookupScope) -> Result<Url> {
    let mut url = self
      .base_url
      .join("parts/search")
      .map_err(|e| eyre!("Failed to build search url: {}", e))?;

    url
      .query_pairs_mut()
      .append_pair("q", key)
      .append_pair("scope", scope.as_str());

    Ok(url)
  }
}

#[async_trait]
impl PartLookup for CatalogClient {
  async fn search(&self, key: &str, scope: LookupScope) -> Result<LookupResponse> {
    let url = self.search_url(key, scope)?;
    debug!(%url, "catalog search");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to search parts for {}: {}", key, e))?
      .error_for_status()
      .map_err(|e| eyre!("Catalog rejected search for {}: {}", key, e))?;

    response
      .json::<LookupResponse>()
      .await
      .map_err(|e| eyre!("Failed to parse search response for {}: {}", key, e))
  }
}
