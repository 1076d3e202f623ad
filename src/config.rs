//! @ai:module:intent Configuration structs for batch runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api BatchConfig, ApiConfig, RunConfig
//! @ai:module:stateless true

use crate::chunk::MAX_BATCH_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// @ai:intent Main configuration for graph-batch
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// @ai:intent Connection settings for the batch endpoint
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Client-side pacing of batch submissions; 0 disables it
    #[serde(default)]
    pub requests_per_minute: u32,
}

/// @ai:intent Batching and throttling behaviour
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// None keeps retrying throttled items until the server stops throttling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_throttle_rounds: Option<u32>,
    #[serde(default = "default_retry_after")]
    pub default_retry_after_secs: u64,
    /// Treat 503/504 item responses like 429
    #[serde(default)]
    pub retry_server_errors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout(),
            requests_per_minute: 0,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_throttle_rounds: None,
            default_retry_after_secs: default_retry_after(),
            retry_server_errors: false,
        }
    }
}

fn default_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

fn default_token_env() -> String {
    "GRAPH_ACCESS_TOKEN".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_retry_after() -> u64 {
    5
}

impl BatchConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Reject settings the batch endpoint cannot honour
    /// @ai:effects pure
    pub fn validate(&self) -> Result<()> {
        if self.run.batch_size == 0 || self.run.batch_size > MAX_BATCH_SIZE {
            return Err(Error::InvalidConfig(format!(
                "batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.run.batch_size
            )));
        }

        if self.api.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig("base_url must not be empty".to_string()));
        }

        Ok(())
    }
}
