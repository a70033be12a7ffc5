//! Object storage configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StorageConfig {
    /// Container (bucket) holding inputs and deliverables.
    #[validate(length(min = 1))]
    #[serde(default = "default_container_name")]
    pub container_name: String,
    /// Root path for the local filesystem provider.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Base URL used when building remote URLs of uploaded deliverables.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            container_name: default_container_name(),
            root_path: default_root_path(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_container_name() -> String {
    "osw".to_string()
}

fn default_root_path() -> String {
    "./data/storage".to_string()
}

fn default_public_base_url() -> String {
    "file://./data/storage".to_string()
}
