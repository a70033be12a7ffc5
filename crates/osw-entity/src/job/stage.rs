//! Job lifecycle enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

use osw_core::QueueMessage;

/// Lifecycle stage of a single inbound message.
///
/// ```text
/// Received -> Classified -> Executing -> {Succeeded | Failed} -> Notified -> CleanedUp
/// ```
///
/// A message that fails to parse goes straight from `Received` or
/// `Classified` to `Failed`. `CleanedUp` is reachable from every stage since
/// workspace removal is unconditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Pulled off the subscription.
    Received,
    /// Routed to a job flow.
    Classified,
    /// Acquire, convert, package and upload in progress.
    Executing,
    /// A deliverable was uploaded.
    Succeeded,
    /// Some stage failed.
    Failed,
    /// The outcome was handed to the publisher.
    Notified,
    /// The workspace is gone.
    CleanedUp,
}

impl JobStage {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: Self) -> bool {
        use JobStage::*;
        match (self, next) {
            (_, CleanedUp) => !matches!(self, CleanedUp),
            (Received, Classified | Failed) => true,
            (Classified, Executing | Failed) => true,
            (Executing, Succeeded | Failed) => true,
            (Succeeded | Failed, Notified) => true,
            _ => false,
        }
    }

    /// Return the stage as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::Executing => "executing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Notified => "notified",
            Self::CleanedUp => "cleaned_up",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which job flow a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Status message from the upstream validation stage.
    Pipeline,
    /// Direct conversion request.
    OnDemand,
}

impl MessageKind {
    /// Route on the message type: anything carrying `on_demand_marker` is an
    /// on-demand request, everything else a pipeline message.
    pub fn classify(message: &QueueMessage, on_demand_marker: &str) -> Self {
        if message.type_contains(on_demand_marker) {
            Self::OnDemand
        } else {
            Self::Pipeline
        }
    }

    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::OnDemand => "on_demand",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of what the converter handed back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// Exactly one artifact.
    SingleFile,
    /// Several artifacts that need packaging.
    MultiFile,
    /// Nothing yet, or the conversion failed.
    #[default]
    None,
}

impl OutputKind {
    /// Classify an artifact count.
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::None,
            1 => Self::SingleFile,
            _ => Self::MultiFile,
        }
    }
}
