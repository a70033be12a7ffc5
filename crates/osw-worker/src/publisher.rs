//! Outbound result messages.

use std::sync::Arc;

use tracing::{error, info};

use osw_core::traits::bus::MessageBus;
use osw_core::{JobError, QueueMessage};
use osw_entity::{JobOutcome, OnDemandRequest, OnDemandResponse, PipelineMessage, ValidationResult};

/// Emits job outcomes onto the publishing topic.
///
/// Publishing never fails a job: every error is mapped to
/// [`JobError::Publish`], logged, and reported back only as `false`.
#[derive(Debug, Clone)]
pub struct ResultPublisher {
    bus: Arc<dyn MessageBus>,
    topic: String,
    result_message_type: String,
}

impl ResultPublisher {
    /// Create a publisher for `topic`; pipeline statuses go out as
    /// `result_message_type`.
    pub fn new(
        bus: Arc<dyn MessageBus>,
        topic: impl Into<String>,
        result_message_type: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            topic: topic.into(),
            result_message_type: result_message_type.into(),
        }
    }

    /// Destination topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Write `outcome` into the status block of `message` and republish it.
    pub async fn publish_pipeline_status(
        &self,
        mut message: PipelineMessage,
        outcome: &JobOutcome,
    ) -> bool {
        message.apply_result(&ValidationResult::from(outcome), outcome.deliverable_url());
        let envelope = message
            .to_queue_message(&self.result_message_type)
            .map_err(|e| self.publish_error(e));
        self.send(envelope, outcome).await
    }

    /// Answer `request` with a response built from `outcome`.
    pub async fn publish_on_demand_response(
        &self,
        request: &OnDemandRequest,
        outcome: &JobOutcome,
    ) -> bool {
        let envelope = OnDemandResponse::from_outcome(request, outcome)
            .to_queue_message()
            .map_err(|e| self.publish_error(e));
        self.send(envelope, outcome).await
    }

    async fn send(&self, envelope: Result<QueueMessage, JobError>, outcome: &JobOutcome) -> bool {
        let result = match envelope {
            Ok(envelope) => self
                .bus
                .publish(&self.topic, &envelope)
                .await
                .map_err(|e| self.publish_error(e)),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(
                    job_id = outcome.job_id(),
                    topic = %self.topic,
                    success = outcome.success(),
                    "Published job outcome"
                );
                true
            }
            Err(e) => {
                error!(
                    job_id = outcome.job_id(),
                    code = e.code(),
                    error = %e,
                    "Failed to publish job outcome"
                );
                false
            }
        }
    }

    fn publish_error(&self, reason: impl std::fmt::Display) -> JobError {
        JobError::Publish {
            topic: self.topic.clone(),
            reason: reason.to_string(),
        }
    }
}
