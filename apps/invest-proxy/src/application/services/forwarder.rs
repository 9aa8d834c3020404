//! Upstream Forwarder
//!
//! Sends a call once and, when the answer is not a 200, classifies it and
//! appends a failure record. The upstream answer itself is never altered.

use std::sync::Arc;

use chrono::Utc;

use crate::application::ports::{FailureLogPort, TransportError, UpstreamPort};
use crate::domain::upstream::{FailureRecord, UpstreamCall, UpstreamErrorKind, UpstreamResponse};

/// Single-attempt forwarder with failure logging.
pub struct Forwarder<U, L>
where
    U: UpstreamPort,
    L: FailureLogPort,
{
    upstream: Arc<U>,
    failure_log: Arc<L>,
}

impl<U, L> Forwarder<U, L>
where
    U: UpstreamPort,
    L: FailureLogPort,
{
    /// Create a new `Forwarder`.
    pub const fn new(upstream: Arc<U>, failure_log: Arc<L>) -> Self {
        Self {
            upstream,
            failure_log,
        }
    }

    /// Send `call` on behalf of the inbound request at `request_uri`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when upstream gave no answer. The failure is
    /// logged before returning.
    pub async fn forward(
        &self,
        call: &UpstreamCall,
        request_uri: &str,
    ) -> Result<UpstreamResponse, TransportError> {
        match self.upstream.send(call).await {
            Ok(response) => {
                if let Some(kind) = UpstreamErrorKind::classify(response.status) {
                    self.log_failure(
                        call,
                        request_uri,
                        response.status,
                        String::new(),
                        kind,
                        String::from_utf8_lossy(&response.body).into_owned(),
                    );
                }
                Ok(response)
            }
            Err(e) => {
                self.log_failure(
                    call,
                    request_uri,
                    0,
                    e.to_string(),
                    UpstreamErrorKind::UnknownError,
                    String::new(),
                );
                Err(e)
            }
        }
    }

    fn log_failure(
        &self,
        call: &UpstreamCall,
        request_uri: &str,
        status: u16,
        transport_error: String,
        kind: UpstreamErrorKind,
        response: String,
    ) {
        let url = self.upstream.url_for(call);

        tracing::warn!(
            status,
            kind = kind.label(),
            method = %call.method,
            url = %url,
            transport_error = %transport_error,
            "Upstream call failed"
        );

        let record = FailureRecord {
            timestamp: Utc::now(),
            request_uri: request_uri.to_string(),
            status,
            transport_error,
            kind,
            url,
            params: call.query.clone(),
            body: call.body.clone(),
            response,
        };

        if let Err(e) = self.failure_log.record(&record) {
            tracing::error!(error = %e, "Failed to append failure record");
        }
    }
}

impl<U, L> Clone for Forwarder<U, L>
where
    U: UpstreamPort,
    L: FailureLogPort,
{
    fn clone(&self) -> Self {
        Self {
            upstream: Arc::clone(&self.upstream),
            failure_log: Arc::clone(&self.failure_log),
        }
    }
}
