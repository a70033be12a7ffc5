//! Conversion request and result types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use osw_core::JobError;
use osw_core::types::{ConversionDirection, DataFormat};

/// A planned conversion, fixed before anything is downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Locator of the input object.
    pub source_locator: String,
    /// Format inferred from the locator's extension.
    pub source_format: DataFormat,
    /// Format to produce.
    pub target_format: DataFormat,
}

impl ConversionRequest {
    /// Direction implied by the source format.
    pub fn direction(&self) -> ConversionDirection {
        self.source_format.direction()
    }
}

/// Outcome of one converter run.
///
/// Either `artifacts` is non-empty and every path existed when the result
/// was built, or `failure` says why there is nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    artifacts: Vec<PathBuf>,
    failure: Option<JobError>,
}

impl ConversionResult {
    /// A successful run. Callers must have checked that `artifacts` exist.
    pub(crate) fn success(artifacts: Vec<PathBuf>) -> Self {
        debug_assert!(!artifacts.is_empty());
        Self {
            artifacts,
            failure: None,
        }
    }

    /// A failed run.
    pub fn failed(error: JobError) -> Self {
        Self {
            artifacts: Vec::new(),
            failure: Some(error),
        }
    }

    /// Whether the converter produced output.
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Why the run failed.
    pub fn error_detail(&self) -> Option<&JobError> {
        self.failure.as_ref()
    }

    /// Produced files in a stable order.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Consume into the artifact list, or the failure.
    pub fn into_artifacts(self) -> Result<Vec<PathBuf>, JobError> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self.artifacts),
        }
    }
}
