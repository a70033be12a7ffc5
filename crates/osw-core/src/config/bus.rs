//! Message bus configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Which message bus implementation to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusProvider {
    /// In-process bus (single-node deployments and tests).
    #[default]
    Memory,
    /// Redis list-backed bus.
    Redis,
}

/// Topic, subscription, and concurrency settings for the bus.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BusConfig {
    /// Bus implementation.
    #[serde(default)]
    pub provider: BusProvider,
    /// Redis connection URL (used when `provider = "redis"`).
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Topic carrying upstream validation results and on-demand requests.
    #[validate(length(min = 1, message = "bus.listening_topic must be set"))]
    #[serde(default)]
    pub listening_topic: String,
    /// Subscription name on the listening topic.
    #[validate(length(min = 1, message = "bus.subscription must be set"))]
    #[serde(default)]
    pub subscription: String,
    /// Topic receiving pipeline status and on-demand responses.
    #[validate(length(min = 1, message = "bus.publishing_topic must be set"))]
    #[serde(default)]
    pub publishing_topic: String,
    /// Maximum number of jobs executing at once.
    #[validate(range(min = 1, max = 256))]
    #[serde(default = "default_max_concurrent_messages")]
    pub max_concurrent_messages: usize,
    /// `messageType` stamped on outbound pipeline status messages.
    #[serde(default = "default_result_message_type")]
    pub result_message_type: String,
    /// Substring of `messageType` that marks an on-demand request.
    #[validate(length(min = 1))]
    #[serde(default = "default_on_demand_marker")]
    pub on_demand_marker: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            provider: BusProvider::default(),
            redis_url: default_redis_url(),
            listening_topic: String::new(),
            subscription: String::new(),
            publishing_topic: String::new(),
            max_concurrent_messages: default_max_concurrent_messages(),
            result_message_type: default_result_message_type(),
            on_demand_marker: default_on_demand_marker(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_max_concurrent_messages() -> usize {
    2
}

fn default_result_message_type() -> String {
    "osw-formatter-result".to_string()
}

fn default_on_demand_marker() -> String {
    "on_demand".to_string()
}
