//! Backend connection settings

use lyra_core::{LyraError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for connecting to the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL (e.g., "https://abc.example.co")
    pub url: String,
    /// Public (anonymous) API key sent with every request
    pub anon_key: String,
    /// Request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl BackendConfig {
    /// Create a new backend config.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate and return a copy with the URL normalized.
    ///
    /// Trailing slashes are removed; the scheme must be http or https.
    pub fn normalized(&self) -> Result<Self> {
        if self.url.trim().is_empty() {
            return Err(LyraError::Config("backend URL cannot be empty".into()));
        }

        let url = self.url.trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&url)
            .map_err(|e| LyraError::Config(format!("invalid backend URL {url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(LyraError::Config(
                "backend URL must start with http:// or https://".into(),
            ));
        }

        if self.anon_key.trim().is_empty() {
            return Err(LyraError::Config("anon key cannot be empty".into()));
        }

        Ok(Self {
            url,
            anon_key: self.anon_key.trim().to_string(),
            timeout_secs: self.timeout_secs.max(1),
        })
    }
}
