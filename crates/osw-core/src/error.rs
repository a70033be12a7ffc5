//! Unified error types for the formatter.
//!
//! Collaborator-facing code maps its internal errors into [`AppError`] for
//! consistent propagation through the `?` operator. Job-facing code speaks
//! [`JobError`], the closed taxonomy every failed job is reported with.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Top-level error kind categorization used across the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// An internal error occurred.
    Internal,
    /// A storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An external service (bus, converter) error occurred.
    ExternalService,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// The unified application error used by collaborators and bootstrap code.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// Failure taxonomy for a single conversion job.
///
/// Every stage of a job maps its failure onto exactly one variant. Apart
/// from [`JobError::Publish`] (swallowed by the publisher) and
/// [`JobError::MalformedMessage`] (handled by the router), these never
/// escape the job's task: they become a failed outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The input object could not be fetched or written locally.
    #[error("Failed to acquire '{locator}': {reason}")]
    Acquisition {
        /// Locator of the input object.
        locator: String,
        /// Why acquisition failed.
        reason: String,
    },

    /// The input (or requested target) format is not recognized.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The converter raised or reported failure.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// The conversion exceeded its wall-clock cap.
    #[error("Conversion timed out after {}s", .limit.as_secs_f64())]
    ConversionTimeout {
        /// The cap that was exceeded.
        limit: Duration,
    },

    /// The converter output could not be normalized into one deliverable.
    #[error("Packaging failed: {0}")]
    Packaging(String),

    /// The deliverable could not be uploaded.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The outcome could not be published onto the bus.
    #[error("Publish to '{topic}' failed: {reason}")]
    Publish {
        /// Destination topic.
        topic: String,
        /// Why publishing failed.
        reason: String,
    },

    /// The inbound payload is missing required fields or is mis-shaped.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}

impl JobError {
    /// Create an acquisition error.
    pub fn acquisition(locator: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Acquisition {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable short code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Acquisition { .. } => "acquisition",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Conversion(_) => "conversion",
            Self::ConversionTimeout { .. } => "conversion_timeout",
            Self::Packaging(_) => "packaging",
            Self::Upload(_) => "upload",
            Self::Publish { .. } => "publish",
            Self::MalformedMessage(_) => "malformed_message",
        }
    }

    /// Whether this failure came out of the converter itself.
    pub fn is_converter_failure(&self) -> bool {
        matches!(self, Self::Conversion(_) | Self::ConversionTimeout { .. })
    }
}
