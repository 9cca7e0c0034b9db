//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! environment variables. The CLI applies its own flags on top.
//!
//! ```json
//! {
//!   "source": "./mirror",
//!   "index_path": "index.json",
//!   "concurrency": 8,
//!   "request_timeout_secs": 20
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::sources::{DEFAULT_BASE_URL, DEFAULT_INDEX_PATH};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL (`http…`) or local directory holding the published data.
    pub source: String,
    /// Location of the index relative to `source`.
    pub index_path: String,
    pub concurrency: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: DEFAULT_BASE_URL.to_string(),
            index_path: DEFAULT_INDEX_PATH.to_string(),
            concurrency: 5,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads the config from a JSON file at `path`; missing keys keep defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Overrides fields from `RANKINGS_*` environment variables.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(source) = var("RANKINGS_SOURCE") {
            self.source = source;
        }
        if let Some(index_path) = var("RANKINGS_INDEX_PATH") {
            self.index_path = index_path;
        }
        if let Some(n) = var("RANKINGS_CONCURRENCY") {
            self.concurrency = n
                .parse()
                .with_context(|| format!("RANKINGS_CONCURRENCY is not a number: {n}"))?;
        }
        if let Some(secs) = var("RANKINGS_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .parse()
                .with_context(|| format!("RANKINGS_TIMEOUT_SECS is not a number: {secs}"))?;
        }
        debug!(config = ?self, "Configuration resolved");
        Ok(self)
    }

    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http")
    }
}
