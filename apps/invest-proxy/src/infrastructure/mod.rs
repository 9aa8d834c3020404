//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the HTTP surfaces.

/// Inbound service credential check.
pub mod auth;

/// Configuration loading.
pub mod config;

/// File-backed failure log.
pub mod failure_log;

/// Health check HTTP endpoint.
pub mod health;

/// Proxy HTTP server.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;

/// Tinkoff Invest OpenAPI client.
pub mod tinkoff;
