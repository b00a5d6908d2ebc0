use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how often accumulated metrics are pushed.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct MetricsConfig {
    /// Value of the `source` tag on every emitted line.
    pub source: String,
    /// Line-protocol push endpoint of the collector.
    pub url: String,
    pub user_id: String,
    pub api_key: String,
    #[serde(default = "default_interval_in_seconds")]
    pub interval_in_seconds: u64,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
    /// When false the registry still accumulates, but nothing is pushed.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_interval_in_seconds() -> u64 {
    10
}

fn default_timeout_in_ms() -> u64 {
    5000
}

fn default_enabled() -> bool {
    true
}

impl MetricsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_in_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_ms)
    }

    /// Credential sent as `Authorization: Bearer <user_id>:<api_key>`.
    pub fn bearer_token(&self) -> String {
        format!("{}:{}", self.user_id, self.api_key)
    }
}
