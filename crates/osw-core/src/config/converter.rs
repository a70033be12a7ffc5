//! Converter invocation configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the external converter command and its time limits.
///
/// Argument templates accept the placeholders `{input}`, `{output_dir}`,
/// `{prefix}`, `{source}` and `{target}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConverterConfig {
    /// Converter executable.
    #[validate(length(min = 1, message = "converter.command must be set"))]
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments for graph-archive to OSM conversions.
    #[serde(default = "default_osw_to_osm_args")]
    pub osw_to_osm_args: Vec<String>,
    /// Arguments for OSM (XML/PBF) to graph-archive conversions.
    #[serde(default = "default_osm_to_osw_args")]
    pub osm_to_osw_args: Vec<String>,
    /// Wall-clock cap for single-file (XML/PBF) conversions.
    #[validate(range(min = 1, max = 86_400))]
    #[serde(default = "default_single_file_timeout")]
    pub single_file_timeout_seconds: u64,
    /// Optional cap for archive conversions; unbounded when absent.
    #[validate(range(min = 1, max = 86_400))]
    #[serde(default)]
    pub archive_timeout_seconds: Option<u64>,
    /// Extra environment variables for the converter process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ConverterConfig {
    /// Cap applied to single-file conversions.
    pub fn single_file_timeout(&self) -> Duration {
        Duration::from_secs(self.single_file_timeout_seconds)
    }

    /// Cap applied to archive conversions, if any.
    pub fn archive_timeout(&self) -> Option<Duration> {
        self.archive_timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            osw_to_osm_args: default_osw_to_osm_args(),
            osm_to_osw_args: default_osm_to_osw_args(),
            single_file_timeout_seconds: default_single_file_timeout(),
            archive_timeout_seconds: None,
            env: HashMap::new(),
        }
    }
}

fn default_command() -> String {
    "osm-osw-reformatter".to_string()
}

fn default_osw_to_osm_args() -> Vec<String> {
    ["osw2osm", "{input}", "--workdir", "{output_dir}", "--prefix", "{prefix}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_osm_to_osw_args() -> Vec<String> {
    ["osm2osw", "{input}", "--workdir", "{output_dir}", "--prefix", "{prefix}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_single_file_timeout() -> u64 {
    3600
}
