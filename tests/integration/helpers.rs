//! Shared test helpers for integration tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tempfile::TempDir;

use osw_bus::MemoryBus;
use osw_converter::{ConversionInvoker, ConversionMetrics, OutputPackager};
use osw_core::config::StorageConfig;
use osw_core::error::AppError;
use osw_core::traits::{
    ByteStream, Converter, ConverterRequest, MessageBus, MessageStream, ObjectStore,
};
use osw_core::{AppResult, QueueMessage};
use osw_storage::LocalObjectStore;
use osw_worker::{JobRunner, ResultPublisher};

/// Container every test input lives in.
pub const CONTAINER: &str = "osw";
/// Topic the router listens on.
pub const REQUESTS: &str = "requests";
/// Topic outcomes are published to.
pub const RESULTS: &str = "results";
/// `messageType` of outbound pipeline statuses.
pub const RESULT_TYPE: &str = "osw-formatter-result";
/// Prefix of every uploaded URL.
pub const PUBLIC_BASE: &str = "https://files.example.com";

/// What the fake converter does when called.
#[derive(Debug, Clone)]
pub enum Script {
    /// Write these files into `<work_dir>/output` and return them.
    Emit(Vec<&'static str>),
    /// Fail with this reason.
    Fail(&'static str),
    /// Sleep, then return nothing.
    Sleep(Duration),
}

/// Converter that follows a [`Script`] and records its calls.
#[derive(Debug)]
pub struct FakeConverter {
    script: Script,
    calls: AtomicUsize,
    last_request: Mutex<Option<ConverterRequest>>,
}

impl FakeConverter {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ConverterRequest> {
        self.last_request.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Converter for FakeConverter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn convert(&self, request: &ConverterRequest) -> AppResult<Vec<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().expect("lock") = Some(request.clone());

        match &self.script {
            Script::Emit(names) => {
                let out = request.work_dir.join("output");
                tokio::fs::create_dir_all(&out).await?;
                let mut files = Vec::new();
                for name in names {
                    let path = out.join(name);
                    tokio::fs::write(&path, format!("converted {name}")).await?;
                    files.push(path);
                }
                Ok(files)
            }
            Script::Fail(reason) => Err(AppError::external(*reason)),
            Script::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Vec::new())
            }
        }
    }
}

/// Local store that counts transfers and can refuse uploads.
#[derive(Debug)]
pub struct CountingStore {
    inner: LocalObjectStore,
    fail_uploads: bool,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
}

impl CountingStore {
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    fn container(&self) -> &str {
        self.inner.container()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn download(&self, remote_path: &str) -> AppResult<ByteStream> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.inner.download(remote_path).await
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> AppResult<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads {
            return Err(AppError::storage("container is read-only"));
        }
        self.inner.upload(local_path, remote_path).await
    }
}

/// Knobs for [`Harness::with_options`].
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub fail_uploads: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            fail_uploads: false,
        }
    }
}

/// A job runner wired to scratch storage, the in-memory bus and a fake
/// converter, with a subscription on the results topic.
pub struct Harness {
    dir: TempDir,
    pub bus: Arc<MemoryBus>,
    pub store: Arc<CountingStore>,
    pub converter: Arc<FakeConverter>,
    pub runner: Arc<JobRunner>,
    results: MessageStream,
}

impl Harness {
    pub async fn new(script: Script) -> Self {
        Self::with_options(script, Options::default()).await
    }

    pub async fn with_options(script: Script, options: Options) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageConfig {
            container_name: CONTAINER.to_string(),
            root_path: dir.path().join("storage").to_string_lossy().into_owned(),
            public_base_url: PUBLIC_BASE.to_string(),
        };
        let inner = LocalObjectStore::new(&storage).await.expect("local store");
        let store = Arc::new(CountingStore {
            inner,
            fail_uploads: options.fail_uploads,
            downloads: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
        });

        let bus = Arc::new(MemoryBus::new());
        let results = bus.subscribe(RESULTS, "test").await.expect("subscribe");

        let converter = Arc::new(FakeConverter::new(script));
        let invoker = ConversionInvoker::new(
            Arc::clone(&converter) as Arc<dyn Converter>,
            options.timeout,
            Some(options.timeout),
            Arc::new(ConversionMetrics::new()),
        );
        let publisher = ResultPublisher::new(
            Arc::clone(&bus) as Arc<dyn MessageBus>,
            RESULTS,
            RESULT_TYPE,
        );
        let runner = Arc::new(JobRunner::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            invoker,
            OutputPackager::new(),
            publisher,
            dir.path().join("downloads"),
        ));

        Self {
            dir,
            bus,
            store,
            converter,
            runner,
            results,
        }
    }

    /// Root of the container on disk.
    pub fn container_root(&self) -> PathBuf {
        self.dir.path().join("storage").join(CONTAINER)
    }

    /// Shared download root of the runner.
    pub fn download_root(&self) -> PathBuf {
        self.dir.path().join("downloads")
    }

    /// Place an input object at a container-relative path.
    pub async fn put_input(&self, path: &str, body: &[u8]) {
        let target = self.container_root().join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.expect("mkdir");
        }
        tokio::fs::write(&target, body).await.expect("write input");
    }

    /// Local file behind an uploaded URL.
    pub fn uploaded_file(&self, url: &str) -> PathBuf {
        let prefix = format!("{PUBLIC_BASE}/{CONTAINER}/");
        let relative = url
            .strip_prefix(&prefix)
            .unwrap_or_else(|| panic!("unexpected upload URL: {url}"));
        self.container_root().join(relative)
    }

    /// Next message on the results topic.
    pub async fn next_result(&mut self) -> QueueMessage {
        let body = tokio::time::timeout(Duration::from_secs(5), self.results.next())
            .await
            .expect("no result published in time")
            .expect("results stream ended")
            .expect("bus error");
        QueueMessage::from_slice(&body).expect("result envelope")
    }

    /// Number of job workspaces left in the download root.
    pub async fn leftover_workspaces(&self) -> usize {
        let mut count = 0;
        if let Ok(mut entries) = tokio::fs::read_dir(self.download_root()).await {
            while let Ok(Some(_)) = entries.next_entry().await {
                count += 1;
            }
        }
        count
    }
}
