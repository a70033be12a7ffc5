//! Local filesystem object store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use osw_core::config::StorageConfig;
use osw_core::error::{AppError, ErrorKind};
use osw_core::result::AppResult;
use osw_core::traits::storage::{ByteStream, ObjectStore};

/// Object store backed by `<root>/<container>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    /// Directory holding the container.
    container_root: PathBuf,
    /// Container name.
    container: String,
    /// Prefix for the URLs returned by uploads.
    public_base_url: String,
}

impl LocalObjectStore {
    /// Create a store for the configured container, creating its directory.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let container_root = PathBuf::from(&config.root_path).join(&config.container_name);
        fs::create_dir_all(&container_root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", container_root.display()),
                e,
            )
        })?;
        Ok(Self {
            container_root,
            container: config.container_name.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a container-relative path to a path on disk.
    fn resolve(&self, path: &str) -> PathBuf {
        let clean = path.trim_start_matches('/');
        self.container_root.join(clean)
    }

    /// Public URL of a container-relative path.
    fn remote_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url,
            self.container,
            path.trim_start_matches('/')
        )
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    fn container(&self) -> &str {
        &self.container
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.container_root.is_dir())
    }

    async fn download(&self, remote_path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(remote_path);
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {remote_path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open object: {remote_path}"),
                    e,
                )
            }
        })?;

        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> AppResult<String> {
        let full_path = self.resolve(remote_path);
        self.ensure_parent(&full_path).await?;

        let bytes = fs::copy(local_path, &full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to upload {} to {remote_path}", local_path.display()),
                e,
            )
        })?;

        debug!(remote_path, bytes, "Uploaded object");
        Ok(self.remote_url(remote_path))
    }
}
