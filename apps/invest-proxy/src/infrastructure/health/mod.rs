//! Health and Metrics Listener
//!
//! A second port for orchestrators and Prometheus. Nothing here checks the
//! service credential or talks to upstream.
//!
//! - `GET /health`: JSON report of the running proxy
//! - `GET /healthz`: plain `OK` liveness check
//! - `GET /metrics`: Prometheus text exposition

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::http::{ServerError, serve};
use crate::infrastructure::metrics::get_metrics_handle;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Always `healthy` while the listener answers.
    pub status: &'static str,
    /// Crate version.
    pub version: String,
    /// When the process started.
    pub started_at: DateTime<Utc>,
    /// Seconds since start.
    pub uptime_secs: u64,
    /// Whether order actions reach upstream.
    pub orders_allowed: bool,
    /// Brokerage API base URL.
    pub upstream_url: String,
}

/// Facts about the running proxy, fixed at startup.
#[derive(Debug)]
pub struct HealthServerState {
    version: String,
    orders_allowed: bool,
    upstream_url: String,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl HealthServerState {
    /// Record startup facts.
    #[must_use]
    pub fn new(version: String, orders_allowed: bool, upstream_url: String) -> Self {
        Self {
            version,
            orders_allowed,
            upstream_url,
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }

    fn report(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            version: self.version.clone(),
            started_at: self.started_at,
            uptime_secs: self.clock.elapsed().as_secs(),
            orders_allowed: self.orders_allowed,
            upstream_url: self.upstream_url.clone(),
        }
    }
}

/// The health listener.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Health listener on `port`, stopped by `cancel`.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the port cannot be bound or serving fails.
    pub async fn run(self) -> Result<(), ServerError> {
        serve("health", self.port, health_router(self.state), self.cancel).await
    }
}

/// Routes of the health listener.
pub fn health_router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(report))
        .route("/healthz", get(|| async { "OK" }))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn report(State(state): State<Arc<HealthServerState>>) -> Json<HealthReport> {
    Json(state.report())
}

async fn metrics() -> Response {
    match get_metrics_handle() {
        Some(handle) => (
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            handle.render(),
        )
            .into_response(),
        None => {
            (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response()
        }
    }
}
