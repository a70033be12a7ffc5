//! Identity and workspace of a single job.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use osw_converter::FsUtils;
use osw_core::JobError;
use osw_core::traits::storage::ObjectStore;
use osw_entity::{JobStage, MessageKind, OutputKind};
use osw_storage::{BlobLocator, download_to_file};

/// State owned by one job from acceptance until cleanup.
///
/// The workspace is a fresh directory under the shared download root,
/// created on first use and never shared with another job. It is removed by
/// [`JobContext::destroy`], or on drop if the job never got that far.
#[derive(Debug)]
pub struct JobContext {
    job_id: String,
    kind: MessageKind,
    download_root: PathBuf,
    workspace_dir: Option<PathBuf>,
    output_kind: OutputKind,
    stage: JobStage,
}

impl JobContext {
    /// Create the context for an accepted message.
    pub fn new(
        job_id: impl Into<String>,
        kind: MessageKind,
        download_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            kind,
            download_root: download_root.into(),
            workspace_dir: None,
            output_kind: OutputKind::None,
            stage: JobStage::Received,
        }
    }

    /// Correlation id of the job.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Which flow the job belongs to.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> JobStage {
        self.stage
    }

    /// Workspace directory, if it has been created.
    pub fn workspace_dir(&self) -> Option<&Path> {
        self.workspace_dir.as_deref()
    }

    /// Shape of the converter output.
    pub fn output_kind(&self) -> OutputKind {
        self.output_kind
    }

    /// Record the shape of the converter output.
    pub fn set_output_kind(&mut self, kind: OutputKind) {
        self.output_kind = kind;
    }

    /// Move to `next`, ignoring (and logging) illegal transitions.
    pub fn advance(&mut self, next: JobStage) -> bool {
        if !self.stage.can_transition_to(next) {
            warn!(
                job_id = %self.job_id,
                from = %self.stage,
                to = %next,
                "Ignoring illegal stage transition"
            );
            return false;
        }
        debug!(job_id = %self.job_id, from = %self.stage, to = %next, "Job stage changed");
        self.stage = next;
        true
    }

    /// Create the workspace if needed and return it.
    pub async fn ensure_workspace(&mut self) -> Result<PathBuf, JobError> {
        if let Some(dir) = &self.workspace_dir {
            return Ok(dir.clone());
        }
        let dir = self
            .download_root
            .join(FsUtils::unique_dir_name(&self.job_id));
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            JobError::acquisition(
                dir.display().to_string(),
                format!("cannot create workspace: {e}"),
            )
        })?;
        debug!(job_id = %self.job_id, workspace = %dir.display(), "Created job workspace");
        self.workspace_dir = Some(dir.clone());
        Ok(dir)
    }

    /// Download the object behind `locator` into the workspace.
    pub async fn acquire(
        &mut self,
        store: &dyn ObjectStore,
        locator: &BlobLocator,
    ) -> Result<PathBuf, JobError> {
        let workspace = self.ensure_workspace().await?;
        let dest = workspace.join(FsUtils::sanitize_file_name(locator.file_name()));

        let bytes = download_to_file(store, locator.path(), &dest)
            .await
            .map_err(|e| JobError::acquisition(locator.raw(), e))?;

        debug!(job_id = %self.job_id, path = %dest.display(), bytes, "Acquired input");
        Ok(dest)
    }

    /// Remove the workspace. Safe to call any number of times.
    pub async fn destroy(&mut self) {
        if let Some(dir) = self.workspace_dir.take() {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {
                    debug!(job_id = %self.job_id, workspace = %dir.display(), "Removed job workspace")
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    job_id = %self.job_id,
                    workspace = %dir.display(),
                    error = %e,
                    "Failed to remove job workspace"
                ),
            }
        }
        if self.stage != JobStage::CleanedUp {
            self.advance(JobStage::CleanedUp);
        }
    }
}

impl Drop for JobContext {
    fn drop(&mut self) {
        if let Some(dir) = self.workspace_dir.take() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
