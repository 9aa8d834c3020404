//! Proxy HTTP Server (Driver Adapter)
//!
//! Axum server that accepts consumer requests on any path. Every request is
//! authenticated first; the `action` query parameter then selects the
//! operation and the pipeline in `ProxyService` does the rest.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FailureLogPort, UpstreamPort};
use crate::application::services::{
    ProxyError, ProxyReply, ProxyRequest, ProxyService, ReplySource,
};
use crate::domain::action::{Action, HttpMethod};
use crate::domain::params::Params;
use crate::infrastructure::auth::ServiceAuthenticator;
use crate::infrastructure::metrics::{RequestOutcome, record_request};

// =============================================================================
// State and Router
// =============================================================================

/// Application state shared across handlers.
pub struct AppState<U, L>
where
    U: UpstreamPort,
    L: FailureLogPort,
{
    /// The request pipeline.
    pub service: Arc<ProxyService<U, L>>,
    /// Inbound credential check.
    pub authenticator: Arc<ServiceAuthenticator>,
}

impl<U, L> AppState<U, L>
where
    U: UpstreamPort,
    L: FailureLogPort,
{
    /// Create new state.
    pub fn new(service: ProxyService<U, L>, authenticator: ServiceAuthenticator) -> Self {
        Self {
            service: Arc::new(service),
            authenticator: Arc::new(authenticator),
        }
    }
}

impl<U, L> Clone for AppState<U, L>
where
    U: UpstreamPort,
    L: FailureLogPort,
{
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

/// Create the proxy router.
///
/// All paths are served by one handler behind the authentication layer.
pub fn create_router<U, L>(state: AppState<U, L>) -> Router
where
    U: UpstreamPort + 'static,
    L: FailureLogPort + 'static,
{
    Router::new()
        .fallback(proxy_handler::<U, L>)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_service_token::<U, L>,
        ))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

async fn require_service_token<U, L>(
    State(state): State<AppState<U, L>>,
    request: Request,
    next: Next,
) -> Result<Response, ProxyError>
where
    U: UpstreamPort + 'static,
    L: FailureLogPort + 'static,
{
    if !state.authenticator.verify(request.headers()) {
        tracing::info!(method = %request.method(), "Rejected unauthenticated request");
        record_request("none", RequestOutcome::Unauthenticated);
        return Err(ProxyError::Unauthenticated);
    }
    Ok(next.run(request).await)
}

async fn proxy_handler<U, L>(
    State(state): State<AppState<U, L>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    U: UpstreamPort + 'static,
    L: FailureLogPort + 'static,
{
    let request = build_request(&method, &uri, &headers, body);
    let label = HttpMethod::parse(&request.method)
        .and_then(|m| Action::resolve(m, request.action.trim()))
        .map_or("none", Action::label);

    match state.service.handle(&request).await {
        Ok(reply) => {
            let outcome = match reply.source {
                ReplySource::Policy => RequestOutcome::Refused,
                ReplySource::Upstream if reply.status == 200 => RequestOutcome::Forwarded,
                ReplySource::Upstream => RequestOutcome::UpstreamError,
            };
            record_request(label, outcome);
            reply.into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, uri = %uri, "Request rejected");
            record_request(
                label,
                match e {
                    ProxyError::UpstreamUnreachable(_) => RequestOutcome::Unreachable,
                    ProxyError::Unauthenticated => RequestOutcome::Unauthenticated,
                    ProxyError::NotFound(_) => RequestOutcome::NotFound,
                },
            );
            e.into_response()
        }
    }
}

/// Translate an axum request into the pipeline's request type.
fn build_request(method: &Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> ProxyRequest {
    let query = uri.query().map(parse_pairs).unwrap_or_default();
    let form = if is_form(headers) {
        std::str::from_utf8(&body).map(parse_pairs).unwrap_or_default()
    } else {
        Params::new()
    };

    ProxyRequest {
        method: method.as_str().to_string(),
        action: query.get("action").unwrap_or_default().to_string(),
        query,
        form,
        body,
        uri: uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string),
    }
}

fn parse_pairs(encoded: &str) -> Params {
    serde_urlencoded::from_str::<Vec<(String, String)>>(encoded)
        .map(Params::from_pairs)
        .unwrap_or_default()
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}

// =============================================================================
// Responses
// =============================================================================

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = (status, Body::from(self.body)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
        };
        status.into_response()
    }
}

// =============================================================================
// Server
// =============================================================================

/// Proxy HTTP server.
pub struct ProxyServer {
    port: u16,
    router: Router,
    cancel: CancellationToken,
}

impl ProxyServer {
    /// Create a new proxy server.
    #[must_use]
    pub const fn new(port: u16, router: Router, cancel: CancellationToken) -> Self {
        Self {
            port,
            router,
            cancel,
        }
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the HTTP server encounters a
    /// fatal error while running.
    pub async fn run(self) -> Result<(), ServerError> {
        serve("proxy", self.port, self.router, self.cancel).await
    }
}

/// Bind `0.0.0.0:port` and serve `router` until `cancel` fires.
///
/// # Errors
///
/// Returns `ServerError::BindFailed` when the port is taken and
/// `ServerError::ServerFailed` when serving stops with an error.
pub async fn serve(
    listener: &'static str,
    port: u16,
    router: Router,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let tcp = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::BindFailed(port, e.to_string()))?;

    tracing::info!(listener, port, "Listening");

    axum::serve(tcp, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

    tracing::info!(listener, "Stopped");
    Ok(())
}

/// Listener errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
