//! Composition root of the job engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use osw_converter::{ConversionInvoker, FsUtils, OutputPackager};
use osw_core::JobError;
use osw_core::error::{AppError, ErrorKind};
use osw_core::result::AppResult;
use osw_core::traits::storage::ObjectStore;
use osw_core::types::DataFormat;
use osw_entity::{JobStage, MessageKind, OutputKind};
use osw_storage::BlobLocator;

use crate::context::JobContext;
use crate::publisher::ResultPublisher;

/// Holds the collaborators every job needs and runs the shared stages.
#[derive(Debug, Clone)]
pub struct JobRunner {
    store: Arc<dyn ObjectStore>,
    invoker: ConversionInvoker,
    packager: OutputPackager,
    publisher: ResultPublisher,
    download_root: PathBuf,
}

impl JobRunner {
    /// Wire a runner.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        invoker: ConversionInvoker,
        packager: OutputPackager,
        publisher: ResultPublisher,
        download_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            invoker,
            packager,
            publisher,
            download_root: download_root.into(),
        }
    }

    /// Publisher for job outcomes.
    pub fn publisher(&self) -> &ResultPublisher {
        &self.publisher
    }

    /// Invoker, for its metrics.
    pub fn invoker(&self) -> &ConversionInvoker {
        &self.invoker
    }

    /// Shared download root.
    pub fn download_root(&self) -> &Path {
        &self.download_root
    }

    /// Fresh context for an accepted message.
    pub fn new_context(&self, job_id: &str, kind: MessageKind) -> JobContext {
        JobContext::new(job_id, kind, &self.download_root)
    }

    /// Acquire, convert, package and upload; return the deliverable's URL.
    ///
    /// The input's format is checked before anything is downloaded.
    /// `remote_path` maps the local deliverable to its upload path.
    #[instrument(skip_all, fields(job_id = %ctx.job_id()))]
    pub async fn execute<F>(
        &self,
        ctx: &mut JobContext,
        raw_locator: &str,
        target: Option<DataFormat>,
        remote_path: F,
    ) -> Result<String, JobError>
    where
        F: FnOnce(&Path) -> String,
    {
        ctx.advance(JobStage::Executing);

        let locator = BlobLocator::parse(raw_locator, self.store.container())?;
        let request = self.invoker.plan(locator.raw(), locator.file_name(), target)?;
        debug!(
            path = locator.path(),
            source = %request.source_format,
            target = %request.target_format,
            "Planned conversion"
        );

        let source = ctx.acquire(self.store.as_ref(), &locator).await?;
        let work_dir = ctx.ensure_workspace().await?;
        let prefix = FsUtils::sanitize_stem(ctx.job_id());

        let result = self
            .invoker
            .convert(&request, &source, &work_dir, &prefix)
            .await;
        ctx.set_output_kind(OutputKind::from_count(result.artifacts().len()));
        let artifacts = result.into_artifacts()?;

        let deliverable = self.packager.package(artifacts, &prefix, &work_dir).await?;
        debug!(
            output_kind = ?ctx.output_kind(),
            deliverable = %deliverable.display(),
            "Packaged output"
        );
        let remote = remote_path(&deliverable);
        let url = self
            .store
            .upload(&deliverable, &remote)
            .await
            .map_err(|e| JobError::Upload(e.to_string()))?;

        info!(remote_path = %remote, url = %url, "Uploaded deliverable");
        Ok(url)
    }

    /// Remove job workspaces left behind by a previous process.
    ///
    /// Only directories named like a job workspace are touched; anything
    /// else under the download root is left alone.
    pub async fn sweep_download_root(&self) -> AppResult<usize> {
        tokio::fs::create_dir_all(&self.download_root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!(
                    "Failed to create download root: {}",
                    self.download_root.display()
                ),
                e,
            )
        })?;

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.download_root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_job_dir = entry
                .file_name()
                .to_str()
                .is_some_and(FsUtils::is_job_dir_name);
            if !is_job_dir || !entry.file_type().await?.is_dir() {
                continue;
            }
            tokio::fs::remove_dir_all(entry.path()).await?;
            removed += 1;
        }

        if removed > 0 {
            info!(removed, root = %self.download_root.display(), "Swept stale job workspaces");
        }
        Ok(removed)
    }
}
