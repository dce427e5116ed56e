//! Source descriptors and listing retrieval for jobsift.
//!
//! Sources are a static, tagged list of structurally identical descriptors;
//! one fetch implementation is parameterized by descriptor rather than one
//! implementation per provider.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

mod fetch;
pub mod payload;

pub use fetch::{FetchError, HttpClientConfig, HttpListingFetcher, ListingFetcher};

pub const CRATE_NAME: &str = "jobsift-sources";

#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegistry {
    pub sources: Vec<SourceConfig>,
}

impl SourceRegistry {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn get(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub display_name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Header the API key is sent in, when one is configured.
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    pub query: SearchQuery,
}

fn default_auth_header() -> String {
    "Authorization".to_string()
}

/// Fixed search-parameter set sent on every page request for a source.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub terms: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub recency_days: Option<u32>,
    #[serde(default = "default_pages")]
    pub pages: u32,
}

fn default_pages() -> u32 {
    1
}
