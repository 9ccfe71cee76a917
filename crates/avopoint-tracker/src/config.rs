/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed tracker configuration
[POS]:    Configuration layer - service address and HTTP timeouts
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use avopoint_adapter::{AvopointClient, ClientConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

/// Connection settings for the document pipeline service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Base address of the service, e.g. "http://localhost:8000"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl TrackerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn build_client(&self) -> avopoint_adapter::Result<AvopointClient> {
        AvopointClient::with_config_and_base_url(self.client_config(), &self.base_url)
    }
}
