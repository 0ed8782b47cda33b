/// Player configuration
use lyra_core::{LyraError, Result};
use lyra_store::BackendConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lyra.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub account: AccountSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub anon_key: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountSettings {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `lyra.toml` is read if
    /// present. Variables such as `LYRA_BACKEND__URL` override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, environment())
    }

    /// Load with an explicit environment source
    pub fn load_from(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(LyraError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(env);

        let config = settings
            .build()
            .map_err(|e| LyraError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| LyraError::Config(e.to_string()))
    }

    /// Validate the settings needed to reach the hosted backend
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.trim().is_empty() {
            return Err(LyraError::Config(
                "backend URL is required (set LYRA_BACKEND__URL)".to_string(),
            ));
        }

        if self.backend.anon_key.trim().is_empty() {
            return Err(LyraError::Config(
                "backend anon key is required (set LYRA_BACKEND__ANON_KEY)".to_string(),
            ));
        }

        self.backend_config().normalized().map(|_| ())
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            url: self.backend.url.clone(),
            anon_key: self.backend.anon_key.clone(),
            timeout_secs: self.backend.timeout_secs,
        }
    }
}

/// `LYRA_` prefixed variables, `__` between nested keys
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("LYRA")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

// Default values
fn default_timeout_secs() -> u64 {
    30
}

fn default_log_filter() -> String {
    "lyra_player=info,lyra_library=info,lyra_store=info".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}
