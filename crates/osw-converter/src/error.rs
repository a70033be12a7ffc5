//! Converter-internal errors.
//!
//! These never reach a job directly: the invoker folds them into a failed
//! [`crate::ConversionResult`] and the packager into
//! [`osw_core::JobError::Packaging`].

use std::path::PathBuf;

use osw_core::error::AppError;
use thiserror::Error;

/// Failures of the subprocess converter and the packaging step.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The converter executable could not be started.
    #[error("Converter command not found: {0}")]
    CommandNotFound(String),

    /// The converter exited with a non-zero status.
    #[error("Converter exited with code {code}: {stderr}")]
    ProcessFailed {
        /// The exit code.
        code: i32,
        /// Captured stderr output (truncated).
        stderr: String,
    },

    /// The converter was terminated by a signal.
    #[error("Converter process was killed (signal termination)")]
    Killed,

    /// The converter succeeded but left nothing in its output directory.
    #[error("Converter produced no output in {path}")]
    OutputMissing {
        /// The scanned output directory.
        path: PathBuf,
    },

    /// Two artifacts would land on the same archive entry.
    #[error("Duplicate artifact name in archive: {name}")]
    DuplicateEntry {
        /// The clashing file name.
        name: String,
    },

    /// An artifact path has no usable file name.
    #[error("Artifact has no file name: {path}")]
    InvalidArtifact {
        /// The offending path.
        path: PathBuf,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP library error.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Tokio task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        match &err {
            ConversionError::CommandNotFound(_) => AppError::configuration(err.to_string()),
            ConversionError::ProcessFailed { .. }
            | ConversionError::Killed
            | ConversionError::OutputMissing { .. } => AppError::external(err.to_string()),
            _ => AppError::internal(err.to_string()),
        }
    }
}
