//! Job worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Job execution settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkerConfig {
    /// Shared download root; every job gets its own subdirectory.
    #[validate(length(min = 1))]
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    /// How long shutdown waits for in-flight jobs before aborting them.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl WorkerConfig {
    /// Shutdown drain cap as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

fn default_download_dir() -> String {
    "./downloads".to_string()
}

fn default_shutdown_grace() -> u64 {
    30
}
