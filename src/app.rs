//! Service wiring: builds the collaborators, starts the router and the
//! health server, and shuts both down on a signal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use osw_converter::{CommandConverter, ConversionInvoker, ConversionMetrics, OutputPackager};
use osw_core::config::{AppConfig, ServerConfig};
use osw_core::traits::converter::Converter;
use osw_core::traits::storage::ObjectStore;
use osw_storage::LocalObjectStore;
use osw_worker::jobs::{OnDemandJobHandler, PipelineJobHandler};
use osw_worker::{JobExecutor, JobRunner, MessageRouter, ResultPublisher};

use crate::health::{self, HealthState};

/// Run the service until a shutdown signal arrives or the router stops.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting OSW formatter v{}", env!("CARGO_PKG_VERSION"));

    // ── Collaborators ────────────────────────────────────────────
    let store = LocalObjectStore::new(&config.storage)
        .await
        .context("Failed to initialize object storage")?;
    let store: Arc<dyn ObjectStore> = Arc::new(store);
    if !store.health_check().await.unwrap_or(false) {
        warn!(container = store.container(), "Object storage is not reachable yet");
    }

    info!("Connecting to message bus (provider: {:?})...", config.bus.provider);
    let bus = osw_bus::connect(&config.bus)
        .await
        .context("Failed to connect to message bus")?;

    let metrics = Arc::new(ConversionMetrics::new());
    let converter: Arc<dyn Converter> = Arc::new(CommandConverter::new(&config.converter));
    let invoker =
        ConversionInvoker::from_config(converter, &config.converter, Arc::clone(&metrics));
    let publisher = ResultPublisher::new(
        Arc::clone(&bus),
        &config.bus.publishing_topic,
        &config.bus.result_message_type,
    );
    info!(topic = publisher.topic(), "Publishing results");

    // ── Job engine ───────────────────────────────────────────────
    let runner = Arc::new(JobRunner::new(
        store,
        invoker,
        OutputPackager::new(),
        publisher,
        &config.worker.download_dir,
    ));
    runner
        .sweep_download_root()
        .await
        .context("Failed to prepare download directory")?;

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(PipelineJobHandler::new(Arc::clone(&runner))));
    executor.register(Arc::new(OnDemandJobHandler::new(Arc::clone(&runner))));

    let router = MessageRouter::new(bus, Arc::new(executor), &config.bus, &config.worker);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Health server ────────────────────────────────────────────
    let health_handle = if config.server.enabled {
        Some(
            start_health_server(
                &config.server,
                HealthState::new(Arc::clone(&metrics)),
                shutdown_rx.clone(),
            )
            .await?,
        )
    } else {
        info!("Health server disabled");
        None
    };

    // ── Serve until shutdown ─────────────────────────────────────
    let mut router_task = tokio::spawn(async move { router.run(shutdown_rx).await });

    let router_result = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received, draining jobs...");
            let _ = shutdown_tx.send(true);
            router_task.await
        }
        result = &mut router_task => {
            let _ = shutdown_tx.send(true);
            result
        }
    };

    if let Some(handle) = health_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!(metrics = ?metrics.snapshot(), "Conversion metrics at shutdown");

    router_result
        .context("Message router task failed")?
        .context("Message router stopped with an error")?;

    info!("OSW formatter shut down gracefully");
    Ok(())
}

/// Bind the health server and serve it until shutdown.
async fn start_health_server(
    config: &ServerConfig,
    state: HealthState,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<JoinHandle<()>> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Health server listening on {}", addr);

    let app = health::router(state);
    Ok(tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        });
        if let Err(e) = server.await {
            error!("Health server error: {}", e);
        }
    }))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
