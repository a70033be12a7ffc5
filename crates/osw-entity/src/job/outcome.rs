//! What a finished job reports.

use serde::{Deserialize, Serialize};

/// Final result of one job, consumed by the result publisher.
///
/// A deliverable URL is present exactly when the job succeeded; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    job_id: String,
    success: bool,
    message: String,
    deliverable_url: Option<String>,
}

impl JobOutcome {
    /// A successful outcome with its uploaded deliverable.
    pub fn succeeded(
        job_id: impl Into<String>,
        message: impl Into<String>,
        deliverable_url: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            success: true,
            message: message.into(),
            deliverable_url: Some(deliverable_url.into()),
        }
    }

    /// A failed outcome.
    pub fn failed(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            success: false,
            message: message.into(),
            deliverable_url: None,
        }
    }

    /// Correlation id of the job.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Whether the job produced a deliverable.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Remote URL of the deliverable.
    pub fn deliverable_url(&self) -> Option<&str> {
        self.deliverable_url.as_deref()
    }
}

/// Validity flag and message written into a pipeline status block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the stage succeeded.
    pub is_valid: bool,
    /// Human-readable message.
    pub validation_message: String,
}

impl ValidationResult {
    /// A failed result with the given message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            validation_message: message.into(),
        }
    }
}

impl From<&JobOutcome> for ValidationResult {
    fn from(outcome: &JobOutcome) -> Self {
        Self {
            is_valid: outcome.success,
            validation_message: outcome.message.clone(),
        }
    }
}
