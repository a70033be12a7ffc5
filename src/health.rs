//! Health endpoint: liveness probes and conversion metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use osw_converter::{ConversionMetrics, MetricsSnapshot};

/// Body returned by every liveness route.
pub const HEALTHY: &str = "I'm healthy !!";

/// Shared state of the health server.
#[derive(Debug, Clone)]
pub struct HealthState {
    metrics: Arc<ConversionMetrics>,
    started_at: Instant,
}

impl HealthState {
    /// Create state reporting `metrics`, with uptime counted from now.
    pub fn new(metrics: Arc<ConversionMetrics>) -> Self {
        Self {
            metrics,
            started_at: Instant::now(),
        }
    }
}

/// Metrics response
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub conversions: MetricsSnapshot,
}

/// Build the health router.
pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/ping", get(liveness).post(liveness))
        .route("/health", get(liveness))
        .route("/health/ping", get(liveness).post(liveness))
        .route("/health/metrics", get(metrics))
        .with_state(state)
}

/// GET /ping
async fn liveness() -> &'static str {
    HEALTHY
}

/// GET /health/metrics
async fn metrics(State(state): State<HealthState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        conversions: state.metrics.snapshot(),
    })
}
