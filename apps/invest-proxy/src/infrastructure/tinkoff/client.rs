//! Tinkoff Invest OpenAPI HTTP client.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::application::ports::{TransportError, UpstreamPort};
use crate::domain::action::HttpMethod;
use crate::domain::upstream::{UpstreamCall, UpstreamResponse};
use crate::infrastructure::metrics::record_upstream_latency;

/// HTTP client for the brokerage API.
///
/// Every call carries `Authorization: Bearer <trading token>` and
/// `Content-Type: application/json`. Calls are sent exactly once.
#[derive(Clone)]
pub struct TinkoffHttpClient {
    client: Client,
    base_url: String,
    trading_token: String,
}

impl TinkoffHttpClient {
    /// Create a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Client` if the token is empty or the
    /// underlying client cannot be built.
    pub fn new(base_url: &str, trading_token: &str) -> Result<Self, TransportError> {
        if trading_token.is_empty() {
            return Err(TransportError::Client("trading token is empty".to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("invest-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            trading_token: trading_token.to_string(),
        })
    }

    /// Base URL calls are issued against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for TinkoffHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TinkoffHttpClient")
            .field("base_url", &self.base_url)
            .field("trading_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    }
}

#[async_trait]
impl UpstreamPort for TinkoffHttpClient {
    async fn send(&self, call: &UpstreamCall) -> Result<UpstreamResponse, TransportError> {
        let url = self.url_for(call);
        let started = Instant::now();

        let mut request = self
            .client
            .request(to_reqwest_method(call.method), &url)
            .bearer_auth(&self.trading_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        if call.method != HttpMethod::Get {
            request = request.body(call.body.clone().unwrap_or_default());
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(url = %url, error = %e, "Upstream request failed");
            TransportError::Request(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        record_upstream_latency(call.path, started.elapsed());
        tracing::debug!(
            method = %call.method,
            path = call.path,
            status,
            bytes = body.len(),
            "Upstream call completed"
        );

        Ok(UpstreamResponse { status, body })
    }

    fn url_for(&self, call: &UpstreamCall) -> String {
        format!("{}{}", self.base_url, call.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_token() {
        assert!(matches!(
            TinkoffHttpClient::new("https://example.test", ""),
            Err(TransportError::Client(_))
        ));
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = TinkoffHttpClient::new("https://example.test/openapi/", "t.token").unwrap();
        assert_eq!(client.base_url(), "https://example.test/openapi");
        assert_eq!(
            client.url_for(&UpstreamCall::get("/portfolio")),
            "https://example.test/openapi/portfolio"
        );
    }

    #[test]
    fn debug_hides_token() {
        let client = TinkoffHttpClient::new("https://example.test", "t.secret-token").unwrap();
        assert!(!format!("{client:?}").contains("secret-token"));
    }
}
