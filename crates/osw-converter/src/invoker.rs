//! Format dispatch and time-boxing around the converter capability.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use osw_core::JobError;
use osw_core::config::ConverterConfig;
use osw_core::traits::converter::{Converter, ConverterRequest};
use osw_core::types::DataFormat;

use crate::filesystem::FsUtils;
use crate::metrics::ConversionMetrics;
use crate::models::{ConversionRequest, ConversionResult};

/// Wraps a [`Converter`] with format dispatch, a wall-clock cap, and result
/// normalization.
///
/// The cap bounds how long a job waits, not how long the converter runs:
/// on expiry the converter task is detached and left to finish on its own.
#[derive(Debug, Clone)]
pub struct ConversionInvoker {
    converter: Arc<dyn Converter>,
    single_file_timeout: Duration,
    archive_timeout: Option<Duration>,
    metrics: Arc<ConversionMetrics>,
}

impl ConversionInvoker {
    /// Create an invoker with explicit time limits.
    pub fn new(
        converter: Arc<dyn Converter>,
        single_file_timeout: Duration,
        archive_timeout: Option<Duration>,
        metrics: Arc<ConversionMetrics>,
    ) -> Self {
        Self {
            converter,
            single_file_timeout,
            archive_timeout,
            metrics,
        }
    }

    /// Create an invoker with the limits from configuration.
    pub fn from_config(
        converter: Arc<dyn Converter>,
        config: &ConverterConfig,
        metrics: Arc<ConversionMetrics>,
    ) -> Self {
        Self::new(
            converter,
            config.single_file_timeout(),
            config.archive_timeout(),
            metrics,
        )
    }

    /// Shared metrics collector.
    pub fn metrics(&self) -> &Arc<ConversionMetrics> {
        &self.metrics
    }

    /// Decide what to convert, before any download.
    ///
    /// The source format comes from the file name's extension. Without an
    /// explicit `target` the opposite family's default is used; a target of
    /// the same family as the source is rejected.
    pub fn plan(
        &self,
        source_locator: &str,
        file_name: &str,
        target: Option<DataFormat>,
    ) -> Result<ConversionRequest, JobError> {
        let source_format = DataFormat::from_path(Path::new(file_name)).ok_or_else(|| {
            JobError::UnsupportedFormat(format!(
                "'{file_name}' (expected one of: {})",
                DataFormat::SUPPORTED_EXTENSIONS.join(", ")
            ))
        })?;

        let target_format = target.unwrap_or_else(|| source_format.default_target());
        if !source_format.can_convert_to(target_format) {
            return Err(JobError::UnsupportedFormat(format!(
                "cannot convert {source_format} to {target_format}"
            )));
        }

        Ok(ConversionRequest {
            source_locator: source_locator.to_string(),
            source_format,
            target_format,
        })
    }

    /// Run the converter on `local_path` inside `work_dir`.
    ///
    /// Never fails: converter errors, panics, empty output and timeouts all
    /// come back as a failed [`ConversionResult`].
    pub async fn convert(
        &self,
        request: &ConversionRequest,
        local_path: &Path,
        work_dir: &Path,
        prefix: &str,
    ) -> ConversionResult {
        let converter_request = ConverterRequest {
            source_path: local_path.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            source_format: request.source_format,
            target_format: request.target_format,
            prefix: prefix.to_string(),
        };
        let limit = if request.source_format.is_archive() {
            self.archive_timeout
        } else {
            Some(self.single_file_timeout)
        };

        self.metrics.record_started();
        let start = Instant::now();
        info!(
            converter = self.converter.name(),
            source = %request.source_format,
            target = %request.target_format,
            timeout_secs = limit.map(|l| l.as_secs()),
            "Starting conversion"
        );

        let converter = Arc::clone(&self.converter);
        let mut task =
            tokio::spawn(async move { converter.convert(&converter_request).await });

        let joined = match limit {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    // Dropping the handle detaches the task.
                    drop(task);
                    self.metrics.record_timeout();
                    warn!(limit_secs = limit.as_secs(), "Conversion timed out");
                    return ConversionResult::failed(JobError::ConversionTimeout { limit });
                }
            },
            None => task.await,
        };

        let error = match joined {
            Ok(Ok(artifacts)) if artifacts.is_empty() => {
                JobError::Packaging("converter reported success but produced no output".into())
            }
            Ok(Ok(artifacts)) => match FsUtils::total_size(&artifacts).await {
                Ok(bytes) => {
                    let elapsed = start.elapsed();
                    self.metrics.record_success(elapsed, bytes);
                    info!(
                        artifacts = artifacts.len(),
                        bytes,
                        duration_ms = elapsed.as_millis() as u64,
                        "Conversion completed"
                    );
                    return ConversionResult::success(artifacts);
                }
                Err(e) => JobError::Conversion(format!("converter output is missing: {e}")),
            },
            Ok(Err(e)) => JobError::Conversion(e.message),
            Err(e) => JobError::Conversion(format!("converter task aborted: {e}")),
        };

        self.metrics.record_failure();
        error!(
            error = %error,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Conversion failed"
        );
        ConversionResult::failed(error)
    }
}
