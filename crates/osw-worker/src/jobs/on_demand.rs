//! On-demand flow: convert the requested object and answer the caller.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use osw_converter::FsUtils;
use osw_core::{JobError, QueueMessage};
use osw_entity::{JobOutcome, JobStage, MessageKind, OnDemandRequest};

use crate::executor::JobHandler;
use crate::runner::JobRunner;

/// Response message of a completed on-demand job.
pub const SUCCESS_MESSAGE: &str = "OK";

/// Handles on-demand requests.
#[derive(Debug)]
pub struct OnDemandJobHandler {
    runner: Arc<JobRunner>,
}

impl OnDemandJobHandler {
    /// Create a handler on top of `runner`.
    pub fn new(runner: Arc<JobRunner>) -> Self {
        Self { runner }
    }

    async fn run(&self, request: &OnDemandRequest, ctx: &mut crate::JobContext) -> JobOutcome {
        let job_id = request.job_id();
        let target = match request.target_format() {
            Some(target) => target,
            None => {
                let e = JobError::UnsupportedFormat(format!(
                    "unknown target format '{}'",
                    request.data.target
                ));
                ctx.advance(JobStage::Executing);
                ctx.advance(JobStage::Failed);
                error!(code = e.code(), error = %e, "Rejected on-demand request");
                return JobOutcome::failed(job_id, e.to_string());
            }
        };

        let target_tag = request.data.target.clone();
        let result = self
            .runner
            .execute(ctx, &request.data.source_url, Some(target), |deliverable| {
                upload_path(deliverable, job_id, &target_tag)
            })
            .await;

        match result {
            Ok(url) => {
                ctx.advance(JobStage::Succeeded);
                info!("Formatting complete");
                JobOutcome::succeeded(job_id, SUCCESS_MESSAGE, url)
            }
            Err(e) => {
                ctx.advance(JobStage::Failed);
                error!(code = e.code(), error = %e, "On-demand formatting failed");
                JobOutcome::failed(job_id, e.to_string())
            }
        }
    }
}

#[async_trait]
impl JobHandler for OnDemandJobHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::OnDemand
    }

    #[instrument(skip_all, fields(message_id = %envelope.message_id, kind = "on_demand"))]
    async fn handle(&self, envelope: QueueMessage) {
        let (request, parsed) = match OnDemandRequest::parse(&envelope) {
            Ok(request) => (request, Ok(())),
            Err(e) => (OnDemandRequest::salvage(&envelope), Err(e)),
        };
        let job_id = match request.job_id() {
            "" => envelope.message_id.as_str(),
            id => id,
        };
        let mut ctx = self.runner.new_context(job_id, MessageKind::OnDemand);
        ctx.advance(JobStage::Classified);

        let outcome = match parsed {
            Ok(()) => {
                info!(job_id, "Received on demand request");
                self.run(&request, &mut ctx).await
            }
            Err(e) => {
                ctx.advance(JobStage::Failed);
                error!(code = e.code(), error = %e, "Rejected on-demand request");
                JobOutcome::failed(request.job_id(), e.to_string())
            }
        };

        self.runner
            .publisher()
            .publish_on_demand_response(&request, &outcome)
            .await;
        ctx.advance(JobStage::Notified);
        ctx.destroy().await;
    }
}

/// `jobs/<jobId>/<target>/<file name>`.
pub fn upload_path(deliverable: &Path, job_id: &str, target: &str) -> String {
    let file_name = deliverable
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    format!(
        "jobs/{}/{}/{file_name}",
        FsUtils::sanitize_stem(job_id),
        FsUtils::sanitize_stem(target)
    )
}
