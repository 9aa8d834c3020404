//! Prometheus Metrics Module
//!
//! Exposes proxy metrics in Prometheus format at `/metrics` on the health
//! server port.
//!
//! - `invest_proxy_requests_total{action,outcome}`
//! - `invest_proxy_upstream_failures_total{kind}`
//! - `invest_proxy_upstream_request_seconds{path}`
//!
//! Recording functions are no-ops until [`init_metrics`] installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::upstream::UpstreamErrorKind;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics setup error.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The global recorder could not be installed.
    #[error("failed to install Prometheus recorder: {0}")]
    InstallFailed(String),
}

/// Initialize the Prometheus metrics recorder.
///
/// Later calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns `MetricsError` if another recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, MetricsError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "invest_proxy_requests_total",
        "Inbound requests by action and outcome"
    );
    describe_counter!(
        "invest_proxy_upstream_failures_total",
        "Upstream calls that did not return 200, by classification"
    );
    describe_histogram!(
        "invest_proxy_upstream_request_seconds",
        "Upstream round-trip time by API path"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// How an inbound request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Upstream answered 200.
    Forwarded,
    /// Upstream answered with another status.
    UpstreamError,
    /// Answered by the order policy gate.
    Refused,
    /// Rejected by authentication.
    Unauthenticated,
    /// Rejected by routing or validation.
    NotFound,
    /// Upstream gave no answer.
    Unreachable,
}

impl RequestOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Forwarded => "forwarded",
            Self::UpstreamError => "upstream_error",
            Self::Refused => "refused",
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not_found",
            Self::Unreachable => "unreachable",
        }
    }
}

/// Record a finished inbound request.
pub fn record_request(action: &'static str, outcome: RequestOutcome) {
    counter!(
        "invest_proxy_requests_total",
        "action" => action,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record an unsuccessful upstream call.
pub fn record_upstream_failure(kind: UpstreamErrorKind) {
    counter!(
        "invest_proxy_upstream_failures_total",
        "kind" => kind.label()
    )
    .increment(1);
}

/// Record upstream round-trip time.
pub fn record_upstream_latency(path: &'static str, duration: Duration) {
    histogram!(
        "invest_proxy_upstream_request_seconds",
        "path" => path
    )
    .record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_as_str() {
        assert_eq!(RequestOutcome::Forwarded.as_str(), "forwarded");
        assert_eq!(RequestOutcome::UpstreamError.as_str(), "upstream_error");
        assert_eq!(RequestOutcome::Refused.as_str(), "refused");
        assert_eq!(RequestOutcome::Unauthenticated.as_str(), "unauthenticated");
        assert_eq!(RequestOutcome::NotFound.as_str(), "not_found");
        assert_eq!(RequestOutcome::Unreachable.as_str(), "unreachable");
    }

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_request("portfolio", RequestOutcome::Forwarded);
        record_upstream_failure(UpstreamErrorKind::TooManyRequests);
        record_upstream_latency("/portfolio", Duration::from_millis(5));
    }
}
