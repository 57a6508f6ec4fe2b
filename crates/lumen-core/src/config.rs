//! Client configuration model.

use serde::{Deserialize, Serialize};

/// Default backend address used when no configuration is present.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Startup configuration of the client.
///
/// Loaded once at startup (config file, then environment override); the base
/// endpoint address is not reconfigurable at runtime.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address of the insight backend.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
        }
    }
}
