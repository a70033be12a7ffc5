//! Streaming transfer of objects to local files.

use std::path::Path;

use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use osw_core::error::{AppError, ErrorKind};
use osw_core::result::AppResult;
use osw_core::traits::storage::ObjectStore;

/// Stream the object at `remote_path` into `dest`, returning the byte count.
///
/// The parent of `dest` must already exist. A partially written file is
/// left in place on error; it lives in the caller's workspace.
pub async fn download_to_file(
    store: &dyn ObjectStore,
    remote_path: &str,
    dest: &Path,
) -> AppResult<u64> {
    let mut stream = store.download(remote_path).await?;

    let mut file = fs::File::create(dest).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create file: {}", dest.display()),
            e,
        )
    })?;

    let mut total_bytes = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
        total_bytes += chunk.len() as u64;
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to write chunk", e))?;
    }

    file.flush()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush file", e))?;

    debug!(remote_path, path = %dest.display(), bytes = total_bytes, "Downloaded object");
    Ok(total_bytes)
}
