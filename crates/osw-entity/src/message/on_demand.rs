//! On-demand conversion request and its response.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use osw_core::types::DataFormat;
use osw_core::{AppResult, JobError, QueueMessage};

use crate::job::JobOutcome;

/// `data` block of an on-demand request. All four fields are required and
/// nothing else is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OnDemandRequestData {
    /// Locator of the input object.
    pub source_url: String,
    /// Caller-supplied correlation id.
    pub job_id: String,
    /// Source format tag.
    pub source: String,
    /// Target format tag.
    pub target: String,
}

/// A direct conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnDemandRequest {
    /// Envelope id, echoed on the response.
    pub message_id: String,
    /// Envelope type, echoed on the response.
    pub message_type: String,
    /// Payload.
    pub data: OnDemandRequestData,
}

impl OnDemandRequest {
    /// Parse an on-demand request, rejecting missing, empty or unknown fields.
    pub fn parse(envelope: &QueueMessage) -> Result<Self, JobError> {
        let data: OnDemandRequestData = serde_json::from_value(envelope.data.clone())
            .map_err(|e| JobError::MalformedMessage(format!("invalid on-demand request: {e}")))?;

        let required = [
            ("sourceUrl", &data.source_url),
            ("jobId", &data.job_id),
            ("source", &data.source),
            ("target", &data.target),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(JobError::MalformedMessage(format!("{field} must not be empty")));
        }

        Ok(Self {
            message_id: envelope.message_id.clone(),
            message_type: envelope.message_type.clone(),
            data,
        })
    }

    /// Recover the identifiers of a request that did not parse so a failure
    /// response can still be addressed. Missing fields come back empty.
    pub fn salvage(envelope: &QueueMessage) -> Self {
        let field = |key: &str| {
            envelope
                .data
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            message_id: envelope.message_id.clone(),
            message_type: envelope.message_type.clone(),
            data: OnDemandRequestData {
                source_url: field("sourceUrl"),
                job_id: field("jobId"),
                source: field("source"),
                target: field("target"),
            },
        }
    }

    /// Correlation id of the job.
    pub fn job_id(&self) -> &str {
        &self.data.job_id
    }

    /// Requested output format, if the tag is known.
    pub fn target_format(&self) -> Option<DataFormat> {
        DataFormat::from_tag(&self.data.target)
    }
}

/// Terminal status reported to an on-demand caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDemandStatus {
    /// A deliverable is available at `formattedUrl`.
    Completed,
    /// The job failed; `message` says why.
    Failed,
}

impl OnDemandStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OnDemandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `data` block of an on-demand response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDemandResponseData {
    /// Echoed from the request.
    pub source_url: String,
    /// Echoed from the request.
    pub job_id: String,
    /// Echoed from the request.
    pub source: String,
    /// Echoed from the request.
    pub target: String,
    /// Terminal status.
    pub status: OnDemandStatus,
    /// Deliverable URL, empty on failure.
    pub formatted_url: String,
    /// `OK` on success, otherwise the failure reason.
    pub message: String,
    /// Same as `status == completed`.
    pub success: bool,
}

/// Response to one on-demand request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnDemandResponse {
    /// Id of the request being answered.
    pub message_id: String,
    /// Type of the request being answered.
    pub message_type: String,
    /// Payload.
    pub data: OnDemandResponseData,
}

impl OnDemandResponse {
    /// Build the response for `request` from the job's outcome.
    pub fn from_outcome(request: &OnDemandRequest, outcome: &JobOutcome) -> Self {
        let (status, formatted_url) = match outcome.deliverable_url() {
            Some(url) if outcome.success() => (OnDemandStatus::Completed, url.to_string()),
            _ => (OnDemandStatus::Failed, String::new()),
        };
        Self {
            message_id: request.message_id.clone(),
            message_type: request.message_type.clone(),
            data: OnDemandResponseData {
                source_url: request.data.source_url.clone(),
                job_id: request.data.job_id.clone(),
                source: request.data.source.clone(),
                target: request.data.target.clone(),
                status,
                formatted_url,
                message: outcome.message().to_string(),
                success: status == OnDemandStatus::Completed,
            },
        }
    }

    /// Build the outbound envelope.
    pub fn to_queue_message(&self) -> AppResult<QueueMessage> {
        Ok(QueueMessage::new(
            self.message_id.clone(),
            self.message_type.clone(),
            serde_json::to_value(&self.data)?,
        ))
    }
}
