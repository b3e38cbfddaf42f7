use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::LookupScope;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub catalog: CatalogConfig,
  #[serde(default)]
  pub resolver: ResolverConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
  /// Base url of the catalog API (the search endpoint is `parts/search`)
  pub url: String,
  /// Audience tier used when none is given on the command line
  #[serde(default)]
  pub default_scope: LookupScope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
  /// Maximum number of lookups per resolution
  #[serde(default = "default_max_steps")]
  pub max_steps: usize,
}

impl Default for ResolverConfig {
  fn default() -> Self {
    Self {
      max_steps: default_max_steps(),
    }
  }
}

fn default_max_steps() -> usize {
  crate::chain::MAX_STEPS
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long a resolved chain is served from memory
  #[serde(default = "default_ttl_minutes")]
  pub ttl_minutes: i64,
  /// Cache bucket used for lookups without a brand
  #[serde(default = "default_fallback_brand")]
  pub fallback_brand: String,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_minutes: default_ttl_minutes(),
      fallback_brand: default_fallback_brand(),
    }
  }
}

fn default_ttl_minutes() -> i64 {
  10
}

fn default_fallback_brand() -> String {
  crate::chain::FALLBACK_BRAND.to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./partchain.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/partchain/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/partchain/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("partchain.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("partchain").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.cache.ttl_minutes <= 0 {
      return Err(eyre!("cache.ttl_minutes must be positive"));
    }
    if config.resolver.max_steps == 0 {
      return Err(eyre!("resolver.max_steps must be at least 1"));
    }
    Ok(config)
  }

  pub fn cache_ttl(&self) -> chrono::Duration {
    chrono::Duration::minutes(self.cache.ttl_minutes)
  }
}
