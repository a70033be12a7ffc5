//! Pipeline flow: format the upload named by a validation-stage message and
//! report back into the pipeline.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use osw_converter::FsUtils;
use osw_core::{JobError, QueueMessage};
use osw_entity::{JobOutcome, JobStage, MessageKind, PipelineMessage};

use crate::executor::JobHandler;
use crate::runner::JobRunner;

/// Status message for a formatted upload.
pub const SUCCESS_MESSAGE: &str = "Formatting Successful!";

/// Prefix of the status message when the converter itself failed.
pub const CONVERTER_FAILURE_MESSAGE: &str = "Could not format OSW to OSM or OSM to OSW";

/// Prefix of the status message for every other failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Error occurred while formatting OSW request";

/// Handles pipeline messages.
#[derive(Debug)]
pub struct PipelineJobHandler {
    runner: Arc<JobRunner>,
}

impl PipelineJobHandler {
    /// Create a handler on top of `runner`.
    pub fn new(runner: Arc<JobRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl JobHandler for PipelineJobHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::Pipeline
    }

    #[instrument(skip_all, fields(message_id = %envelope.message_id, kind = "pipeline"))]
    async fn handle(&self, envelope: QueueMessage) {
        let mut ctx = self
            .runner
            .new_context(&envelope.message_id, MessageKind::Pipeline);
        ctx.advance(JobStage::Classified);

        let (message, outcome) = match PipelineMessage::parse(&envelope) {
            Ok(message) => {
                info!(record_id = message.record_id(), "Message received for formatting");
                let project_group_id = message.project_group_id().to_string();
                let record_id = message.record_id().to_string();
                let uploaded_at = Utc::now();

                let result = self
                    .runner
                    .execute(&mut ctx, message.file_upload_path(), None, |deliverable| {
                        upload_path(deliverable, &project_group_id, &record_id, uploaded_at)
                    })
                    .await;
                let outcome = match result {
                    Ok(url) => {
                        ctx.advance(JobStage::Succeeded);
                        JobOutcome::succeeded(message.record_id(), SUCCESS_MESSAGE, url)
                    }
                    Err(e) => {
                        ctx.advance(JobStage::Failed);
                        error!(code = e.code(), error = %e, "Formatting failed");
                        JobOutcome::failed(message.record_id(), status_message(&e))
                    }
                };
                (message, outcome)
            }
            Err(e) => {
                ctx.advance(JobStage::Failed);
                error!(code = e.code(), error = %e, "Rejected pipeline message");
                let message = PipelineMessage::salvage(&envelope);
                let outcome = JobOutcome::failed(message.record_id(), status_message(&e));
                (message, outcome)
            }
        };

        self.runner
            .publisher()
            .publish_pipeline_status(message, &outcome)
            .await;
        ctx.advance(JobStage::Notified);
        ctx.destroy().await;
    }
}

/// Human-readable status for a failed pipeline job.
pub fn status_message(error: &JobError) -> String {
    match error {
        e if e.is_converter_failure() => format!("{CONVERTER_FAILURE_MESSAGE}: {e}"),
        JobError::MalformedMessage(detail) => format!("{GENERIC_FAILURE_MESSAGE} {detail}"),
        e => format!("{GENERIC_FAILURE_MESSAGE} {e}"),
    }
}

/// `<YEAR>/<MONTH>/<project group>/<record>/<stem>_<unix ts><ext>`.
pub fn upload_path(
    deliverable: &Path,
    project_group_id: &str,
    record_id: &str,
    at: DateTime<Utc>,
) -> String {
    let stem = deliverable
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = deliverable
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut path = at.format("%Y/%B").to_string().to_uppercase();
    for segment in [project_group_id, record_id] {
        if !segment.is_empty() {
            path.push('/');
            path.push_str(&FsUtils::sanitize_stem(segment));
        }
    }
    format!("{path}/{stem}_{}{ext}", at.timestamp())
}
