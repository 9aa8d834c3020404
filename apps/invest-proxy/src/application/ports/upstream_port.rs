//! Upstream Port (Driven Port)
//!
//! Interface for issuing one call against the brokerage API with the
//! trading credential attached.

use async_trait::async_trait;

use crate::domain::upstream::{UpstreamCall, UpstreamResponse};

/// Failure to obtain any HTTP answer from upstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent (DNS, connect, TLS).
    #[error("upstream request failed: {0}")]
    Request(String),

    /// The response body could not be read.
    #[error("upstream body read failed: {0}")]
    Body(String),

    /// The HTTP client could not be constructed.
    #[error("upstream client setup failed: {0}")]
    Client(String),
}

/// Port for the brokerage API.
#[async_trait]
pub trait UpstreamPort: Send + Sync {
    /// Send `call` once and return whatever status and body come back.
    ///
    /// Any HTTP status, including errors, is `Ok`. `Err` means no answer.
    async fn send(&self, call: &UpstreamCall) -> Result<UpstreamResponse, TransportError>;

    /// Full URL of `call` without its query string.
    fn url_for(&self, call: &UpstreamCall) -> String;
}

#[cfg(test)]
pub mod stub {
    use std::collections::HashMap;

    use bytes::Bytes;
    use parking_lot::Mutex;

    use super::{TransportError, UpstreamPort, async_trait};
    use crate::domain::upstream::{UpstreamCall, UpstreamResponse};

    /// Scripted upstream that records every call it receives.
    #[derive(Debug, Default)]
    pub struct StubUpstream {
        scripted: Mutex<HashMap<&'static str, Result<UpstreamResponse, TransportError>>>,
        calls: Mutex<Vec<UpstreamCall>>,
    }

    impl StubUpstream {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer calls to `path` with `status` and `body`.
        pub fn respond(self, path: &'static str, status: u16, body: &'static str) -> Self {
            self.scripted.lock().insert(
                path,
                Ok(UpstreamResponse {
                    status,
                    body: Bytes::from_static(body.as_bytes()),
                }),
            );
            self
        }

        /// Fail calls to `path` without an answer.
        pub fn fail(self, path: &'static str, error: TransportError) -> Self {
            self.scripted.lock().insert(path, Err(error));
            self
        }

        pub fn calls(&self) -> Vec<UpstreamCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl UpstreamPort for StubUpstream {
        async fn send(&self, call: &UpstreamCall) -> Result<UpstreamResponse, TransportError> {
            self.calls.lock().push(call.clone());
            self.scripted
                .lock()
                .get(call.path)
                .cloned()
                .unwrap_or_else(|| {
                    Ok(UpstreamResponse {
                        status: 200,
                        body: Bytes::from_static(br#"{"status":"Ok"}"#),
                    })
                })
        }

        fn url_for(&self, call: &UpstreamCall) -> String {
            format!("https://upstream.test/openapi{}", call.path)
        }
    }
}
