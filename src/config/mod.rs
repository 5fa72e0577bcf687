//! Configuration management.
//!
//! Configuration can come from:
//! - Environment variables (CROWNPEAK_DQM_*)
//! - Config file (~/.config/crownpeak-dqm/config.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// crownpeak-dqm configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// DQM request defaults
    #[serde(default)]
    pub dqm: DqmConfig,
}

/// Defaults applied when building and sending DQM requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqmConfig {
    /// Page size for `listAssets` when the node does not set `limit`
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Content type sent with `createAsset` when the node does not set one
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    /// Credential profile used when the node does not name one
    #[serde(default = "default_credential")]
    pub default_credential: String,

    /// Total request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Connect timeout (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for DqmConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_content_type: default_content_type(),
            default_credential: default_credential(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

fn default_limit() -> u32 {
    20
}

fn default_content_type() -> String {
    "text/html; charset=UTF-8".to_string()
}

fn default_credential() -> String {
    "crownpeak".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from default locations.
    pub fn load() -> Self {
        let mut config = Self::default();

        let path = Self::config_dir().join("config.toml");
        if let Ok(partial) = Self::load_partial_from_path(&path) {
            config.apply_partial(partial);
        }

        config.apply_env_overrides();
        config
    }

    /// Get the data directory.
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("crownpeak-dqm"))
            .unwrap_or_else(|| PathBuf::from(".crownpeak-dqm"))
    }

    /// Get the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("crownpeak-dqm"))
            .unwrap_or_else(|| PathBuf::from(".crownpeak-dqm"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(limit) = std::env::var("CROWNPEAK_DQM_DEFAULT_LIMIT") {
            if let Ok(parsed) = limit.parse::<u32>() {
                if parsed >= 1 {
                    self.dqm.default_limit = parsed;
                }
            }
        }
        if let Ok(content_type) = std::env::var("CROWNPEAK_DQM_CONTENT_TYPE") {
            self.dqm.default_content_type = content_type;
        }
        if let Ok(credential) = std::env::var("CROWNPEAK_DQM_CREDENTIAL") {
            self.dqm.default_credential = credential;
        }
        if let Ok(timeout) = std::env::var("CROWNPEAK_DQM_TIMEOUT_SECONDS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.dqm.timeout_seconds = parsed;
            }
        }
        if let Ok(timeout) = std::env::var("CROWNPEAK_DQM_CONNECT_TIMEOUT_SECONDS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.dqm.connect_timeout_seconds = parsed;
            }
        }
    }

    fn load_partial_from_path(path: &Path) -> std::result::Result<PartialConfig, ()> {
        let content = std::fs::read_to_string(path).map_err(|_| ())?;
        toml::from_str(&content).map_err(|_| ())
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(dqm) = partial.dqm {
            self.dqm = dqm;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    dqm: Option<DqmConfig>,
}
