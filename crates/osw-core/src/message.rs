//! Raw bus envelope shared by every message family.
//!
//! The bus only ever moves [`QueueMessage`] values. Typed payloads live in
//! `osw-entity` and are parsed out of [`QueueMessage::data`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JobError;

/// Envelope carried on every topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    /// Correlation identifier of the message.
    pub message_id: String,
    /// Message family tag.
    pub message_type: String,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Publication timestamp as sent by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// Family-specific payload.
    #[serde(default)]
    pub data: Value,
}

impl QueueMessage {
    /// Create a new envelope stamped with the current time.
    pub fn new(message_id: impl Into<String>, message_type: impl Into<String>, data: Value) -> Self {
        Self {
            message_id: message_id.into(),
            message_type: message_type.into(),
            message: None,
            published_date: Some(Utc::now().to_rfc3339()),
            data,
        }
    }

    /// Parse an envelope from raw bus bytes.
    ///
    /// Only the envelope is checked here; an empty `messageId` is rejected
    /// since nothing downstream could be correlated with it.
    pub fn from_slice(body: &[u8]) -> Result<Self, JobError> {
        let message: Self = serde_json::from_slice(body)
            .map_err(|e| JobError::MalformedMessage(format!("invalid envelope: {e}")))?;
        if message.message_id.trim().is_empty() {
            return Err(JobError::MalformedMessage("messageId is empty".to_string()));
        }
        Ok(message)
    }

    /// Recover an addressable envelope from bytes that failed
    /// [`from_slice`](Self::from_slice).
    ///
    /// Returns `None` unless the body is a JSON object with a non-empty
    /// string `messageId`. Fields with an unexpected type come back empty.
    pub fn recover(body: &[u8]) -> Option<Self> {
        let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(body) else {
            return None;
        };
        let mut take_str = |key: &str| match map.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let message_id = take_str("messageId").filter(|id| !id.trim().is_empty())?;
        let message_type = take_str("messageType").unwrap_or_default();
        let message = take_str("message");
        let published_date = take_str("publishedDate");
        Some(Self {
            message_id,
            message_type,
            message,
            published_date,
            data: map.remove("data").unwrap_or_default(),
        })
    }

    /// Whether `messageType` contains `marker`, ignoring case.
    pub fn type_contains(&self, marker: &str) -> bool {
        self.message_type
            .to_ascii_lowercase()
            .contains(&marker.to_ascii_lowercase())
    }
}
