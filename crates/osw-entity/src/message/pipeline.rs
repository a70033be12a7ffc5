//! Pipeline-stage status message.
//!
//! The upstream validation stage and this formatter share one schema: the
//! formatter reads `file_upload_path` and `tdei_project_group_id`, writes
//! `success`, `message` and `formatted_url`, and carries every other field
//! of `data` through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use osw_core::{AppResult, JobError, QueueMessage};

use crate::job::ValidationResult;

/// Message text for a pipeline payload without an input locator.
pub const MISSING_FILE_PATH: &str = "Request does not have a valid file path specified.";

/// `data` block of a pipeline message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineData {
    /// Percent-encoded locator of the uploaded input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_upload_path: Option<String>,
    /// Project group the upload belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdei_project_group_id: Option<String>,
    /// Validity flag of the most recent stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Human-readable message of the most recent stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// URL of the formatted deliverable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_url: Option<String>,
    /// Fields owned by other stages.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A pipeline message addressed to the formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineMessage {
    /// Correlation id; doubles as the record id.
    pub message_id: String,
    /// Inbound message type.
    pub message_type: String,
    /// Free-text description carried by the envelope.
    pub message: Option<String>,
    /// Payload.
    pub data: PipelineData,
}

impl PipelineMessage {
    /// Parse a pipeline message, failing closed on a mis-shaped payload or a
    /// missing required field.
    pub fn parse(envelope: &QueueMessage) -> Result<Self, JobError> {
        if envelope.message_type.trim().is_empty() {
            return Err(JobError::MalformedMessage(
                "messageType is required".to_string(),
            ));
        }
        if !envelope.data.is_object() {
            return Err(JobError::MalformedMessage(
                "pipeline data must be an object".to_string(),
            ));
        }
        let data: PipelineData = serde_json::from_value(envelope.data.clone())
            .map_err(|e| JobError::MalformedMessage(format!("invalid pipeline data: {e}")))?;

        if data.file_upload_path.as_deref().is_none_or(|p| p.trim().is_empty()) {
            return Err(JobError::MalformedMessage(MISSING_FILE_PATH.to_string()));
        }
        if data
            .tdei_project_group_id
            .as_deref()
            .is_none_or(|p| p.trim().is_empty())
        {
            return Err(JobError::MalformedMessage(
                "tdei_project_group_id is required".to_string(),
            ));
        }

        Ok(Self::with_data(envelope, data))
    }

    /// Recover whatever can be recovered from an envelope whose payload did
    /// not parse, so a failure status can still be sent for its id.
    ///
    /// Fields with an unexpected type are dropped; everything else in
    /// `data` is kept.
    pub fn salvage(envelope: &QueueMessage) -> Self {
        let mut extra = match &envelope.data {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let mut take_str = |key: &str| match extra.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let file_upload_path = take_str("file_upload_path");
        let tdei_project_group_id = take_str("tdei_project_group_id");
        for owned in ["success", "message", "formatted_url"] {
            extra.remove(owned);
        }
        let data = PipelineData {
            file_upload_path,
            tdei_project_group_id,
            extra,
            ..PipelineData::default()
        };
        Self::with_data(envelope, data)
    }

    fn with_data(envelope: &QueueMessage, data: PipelineData) -> Self {
        Self {
            message_id: envelope.message_id.clone(),
            message_type: envelope.message_type.clone(),
            message: envelope.message.clone(),
            data,
        }
    }

    /// Record id the upload path and workspace are keyed on.
    pub fn record_id(&self) -> &str {
        &self.message_id
    }

    /// Project group of the upload, or an empty string.
    pub fn project_group_id(&self) -> &str {
        self.data.tdei_project_group_id.as_deref().unwrap_or_default()
    }

    /// Raw (still percent-encoded) input locator, or an empty string.
    pub fn file_upload_path(&self) -> &str {
        self.data.file_upload_path.as_deref().unwrap_or_default()
    }

    /// Overwrite the status block with a stage result.
    pub fn apply_result(&mut self, result: &ValidationResult, formatted_url: Option<&str>) {
        self.data.success = Some(result.is_valid);
        self.data.message = Some(result.validation_message.clone());
        if let Some(url) = formatted_url {
            self.data.formatted_url = Some(url.to_string());
        }
    }

    /// Build the outbound envelope under `result_message_type`.
    pub fn to_queue_message(&self, result_message_type: &str) -> AppResult<QueueMessage> {
        let mut envelope = QueueMessage::new(
            self.message_id.clone(),
            result_message_type,
            serde_json::to_value(&self.data)?,
        );
        envelope.message = self.message.clone();
        Ok(envelope)
    }
}
