//! Invest Proxy Binary
//!
//! Starts the credential gateway and its health server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin invest-proxy
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `TINKOFF_API_TOKEN`: Trading token sent to the brokerage API
//! - `SERVICE_API_TOKEN`: Token the downstream consumer must present
//!
//! ## Optional
//! - `ORDERS_ALLOW`: Forward order actions - "true" | "1" | "yes" | "on" (default: false)
//! - `INVEST_PROXY_PORT`: Proxy HTTP port (default: 8080)
//! - `INVEST_PROXY_HEALTH_PORT`: Health check and metrics HTTP port (default: 8082)
//! - `INVEST_PROXY_UPSTREAM_URL`: Brokerage API base URL (default: <https://api-invest.tinkoff.ru/openapi>)
//! - `INVEST_PROXY_LOG_FILE`: Failure log file (default: invest-proxy.log)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: invest-proxy)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use invest_proxy::infrastructure::telemetry;
use invest_proxy::{
    AppState, FileFailureLog, Forwarder, HealthServer, HealthServerState, OrderPolicy,
    ProxyConfig, ProxyServer, ProxyService, ServiceAuthenticator, TinkoffHttpClient,
    create_router, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize telemetry (tracing + optional OTLP export)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Invest Proxy");

    // Initialize Prometheus metrics
    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Metrics disabled");
    }

    let config = ProxyConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Adapters
    let failure_log = Arc::new(
        FileFailureLog::open(&config.failure_log_path).context("failure log unavailable")?,
    );
    let upstream = Arc::new(
        TinkoffHttpClient::new(&config.upstream_url, config.credentials.trading_token())
            .context("failed to build upstream client")?,
    );

    // Health endpoint metadata
    let upstream_url = upstream.base_url().to_string();

    // Request pipeline
    let forwarder = Forwarder::new(upstream, failure_log);
    let service = ProxyService::new(forwarder, OrderPolicy::new(config.orders_allowed));
    let state = AppState::new(
        service,
        ServiceAuthenticator::new(config.credentials.service_token()),
    );

    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        state.service.policy().orders_allowed(),
        upstream_url,
    ));

    let proxy_server = ProxyServer::new(
        config.server.port,
        create_router(state),
        shutdown_token.clone(),
    );

    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );

    // Spawn health server
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    // Spawn proxy server; a failed bind ends the process
    let proxy_shutdown = shutdown_token.clone();
    let proxy_handle = tokio::spawn(async move {
        if let Err(e) = proxy_server.run().await {
            tracing::error!(error = %e, "Proxy server error");
            proxy_shutdown.cancel();
        }
    });

    tracing::info!("Invest proxy ready");

    tokio::select! {
        () = await_shutdown() => shutdown_token.cancel(),
        () = shutdown_token.cancelled() => {}
    }

    let _ = tokio::join!(proxy_handle, health_handle);

    tracing::info!("Invest proxy stopped");
    Ok(())
}

/// Log the parsed configuration. Tokens are never logged.
fn log_config(config: &ProxyConfig) {
    tracing::info!(
        port = config.server.port,
        health_port = config.server.health_port,
        orders_allowed = config.orders_allowed,
        "Configuration loaded"
    );
    tracing::debug!(
        upstream_url = %config.upstream_url,
        failure_log = %config.failure_log_path.display(),
        "Upstream endpoint"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
