#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Invest Proxy - Read-only Credential Gateway
//!
//! An HTTP proxy that keeps the Tinkoff Invest trading token on the server
//! and exposes a small, separately authenticated subset of the OpenAPI to a
//! downstream statistics service.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Actions, parameter rules, the order policy gate
//!   - `action`: Supported `(method, action)` routes
//!   - `params`: Account context, depth clamping, timestamp validation
//!   - `policy`: Order gate and canned responses
//!   - `operations`: Commission removal from operation lists
//!   - `upstream`: Upstream calls, failure classification and records
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Upstream API and failure log interfaces
//!   - `services`: The request pipeline and the forwarder
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `auth`: Bearer credential lookup
//!   - `tinkoff`: `reqwest` client for the brokerage API
//!   - `failure_log`: Append-only failure log file
//!   - `http`: Axum proxy server
//!   - `config`, `health`, `metrics`, `telemetry`
//!
//! # Request Flow
//!
//! ```text
//! consumer ──► authenticate ──► route ──► policy gate ──► validate ──► upstream
//!                 │ 401            │ 404       │ canned 200      │ 404       │
//!                 ▼                ▼           ▼                 ▼           ▼
//!                                   response to consumer        relay + failure log
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Request semantics with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::action::{Action, HttpMethod};
pub use domain::policy::{GateDecision, OrderPolicy};
pub use domain::upstream::{FailureRecord, UpstreamCall, UpstreamErrorKind, UpstreamResponse};

// Application services and ports
pub use application::ports::{
    FailureLogError, FailureLogPort, InMemoryFailureLog, TransportError, UpstreamPort,
};
pub use application::services::{Forwarder, ProxyError, ProxyReply, ProxyRequest, ProxyService};

// Infrastructure config
pub use infrastructure::config::{ConfigError, Credentials, ProxyConfig, ServerSettings};

// Adapters
pub use infrastructure::auth::ServiceAuthenticator;
pub use infrastructure::failure_log::FileFailureLog;
pub use infrastructure::tinkoff::TinkoffHttpClient;

// Servers
pub use infrastructure::health::{HealthServer, HealthServerState};
pub use infrastructure::http::{AppState, ProxyServer, ServerError, create_router};

// Metrics
pub use infrastructure::metrics::{MetricsError, init_metrics};

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
