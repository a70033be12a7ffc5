//! Object store trait for pluggable blob backends.

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// A byte stream type used for reading object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for the blob store jobs read inputs from and write deliverables to.
///
/// Paths are relative to the store's container. The [`ObjectStore`] trait
/// is defined here in `osw-core` and implemented in `osw-storage`.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Name of the container this store reads from and writes to.
    fn container(&self) -> &str;

    /// Check whether the store is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Open the object at `remote_path` as a byte stream.
    async fn download(&self, remote_path: &str) -> AppResult<ByteStream>;

    /// Upload the local file to `remote_path` and return its public URL.
    async fn upload(&self, local_path: &Path, remote_path: &str) -> AppResult<String>;
}
