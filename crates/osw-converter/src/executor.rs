//! Subprocess implementation of the converter capability.
//!
//! Runs the configured reformatter command once per conversion with its
//! arguments templated from the request, and reports whatever it left in a
//! fresh output directory inside the job's workspace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info};

use osw_core::config::ConverterConfig;
use osw_core::error::AppError;
use osw_core::traits::converter::{Converter, ConverterRequest};
use osw_core::types::ConversionDirection;

use crate::error::ConversionError;
use crate::filesystem::FsUtils;

/// Name of the directory the converter writes into, under the work dir.
const OUTPUT_DIR_NAME: &str = "output";

/// Converter that shells out to an external command.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    command: String,
    osw_to_osm_args: Vec<String>,
    osm_to_osw_args: Vec<String>,
    env_vars: HashMap<String, String>,
}

impl CommandConverter {
    /// Build from the converter section of the configuration.
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            command: config.command.clone(),
            osw_to_osm_args: config.osw_to_osm_args.clone(),
            osm_to_osw_args: config.osm_to_osw_args.clone(),
            env_vars: config.env.clone(),
        }
    }

    /// Substitute template placeholders in arguments.
    pub fn substitute_args(
        template_args: &[String],
        request: &ConverterRequest,
        output_dir: &Path,
    ) -> Vec<String> {
        let input = request.source_path.to_string_lossy();
        let output_dir = output_dir.to_string_lossy();

        template_args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output_dir}", &output_dir)
                    .replace("{prefix}", &request.prefix)
                    .replace("{source}", request.source_format.as_str())
                    .replace("{target}", request.target_format.as_str())
            })
            .collect()
    }

    async fn run(&self, request: &ConverterRequest) -> Result<Vec<PathBuf>, ConversionError> {
        let output_dir = request.work_dir.join(OUTPUT_DIR_NAME);
        tokio::fs::create_dir_all(&output_dir).await?;

        let template = match request.source_format.direction() {
            ConversionDirection::OswToOsm => &self.osw_to_osm_args,
            ConversionDirection::OsmToOsw => &self.osm_to_osw_args,
        };
        let args = Self::substitute_args(template, request, &output_dir);

        info!(
            command = %self.command,
            ?args,
            input = %request.source_path.display(),
            "Executing converter"
        );

        let mut cmd = Command::new(&self.command);
        cmd.args(&args)
            .current_dir(&request.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConversionError::CommandNotFound(self.command.clone())
            } else {
                ConversionError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return match output.status.code() {
                Some(code) => {
                    error!(
                        command = %self.command,
                        code,
                        stderr = %stderr.chars().take(500).collect::<String>(),
                        "Converter failed"
                    );
                    Err(ConversionError::ProcessFailed {
                        code,
                        stderr: stderr.chars().take(2000).collect(),
                    })
                }
                None => Err(ConversionError::Killed),
            };
        }

        let files = FsUtils::collect_files(&output_dir).await?;
        if files.is_empty() {
            return Err(ConversionError::OutputMissing { path: output_dir });
        }
        Ok(files)
    }
}

#[async_trait]
impl Converter for CommandConverter {
    fn name(&self) -> &str {
        &self.command
    }

    async fn convert(&self, request: &ConverterRequest) -> Result<Vec<PathBuf>, AppError> {
        self.run(request).await.map_err(AppError::from)
    }
}
