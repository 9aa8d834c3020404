//! Proxy Request Pipeline
//!
//! Turns an authenticated inbound request into at most two upstream calls:
//!
//! 1. reject methods other than `GET` and `POST`;
//! 2. resolve the `(method, action)` pair;
//! 3. apply the order policy gate;
//! 4. validate parameters and forward.
//!
//! Authentication happens before this service is reached.

use bytes::Bytes;
use serde_json::json;

use crate::application::ports::{FailureLogPort, TransportError, UpstreamPort};
use crate::domain::action::{Action, HttpMethod};
use crate::domain::operations::strip_commissions;
use crate::domain::params::{
    BrokerAccountId, CanonicalTimestamp, OrderbookDepth, Params, parse_leading_int,
};
use crate::domain::policy::{GateDecision, OrderPolicy};
use crate::domain::upstream::{UpstreamCall, UpstreamResponse};

use super::forwarder::Forwarder;

/// Query key that asks for commission entries to be removed.
pub const CLEAN_COMMISSION_PARAM: &str = "clean_comission";

// =============================================================================
// Request / Reply
// =============================================================================

/// An authenticated inbound request.
#[derive(Debug, Clone, Default)]
pub struct ProxyRequest {
    /// Method name as received.
    pub method: String,
    /// Value of the `action` query parameter, untrimmed.
    pub action: String,
    /// Query parameters.
    pub query: Params,
    /// Url-encoded form parameters from the body, if any.
    pub form: Params,
    /// Raw request body.
    pub body: Bytes,
    /// Request URI (path and query) for the failure log.
    pub uri: String,
}

/// Where a reply body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Relayed or derived from upstream.
    Upstream,
    /// Produced locally by the policy gate.
    Policy,
}

/// Reply for the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyReply {
    /// HTTP status to answer with.
    pub status: u16,
    /// JSON body bytes.
    pub body: Bytes,
    /// Origin of the body.
    pub source: ReplySource,
}

impl ProxyReply {
    fn relay(response: UpstreamResponse) -> Self {
        Self {
            status: response.status,
            body: response.body,
            source: ReplySource::Upstream,
        }
    }

    fn local(value: &serde_json::Value, source: ReplySource) -> Self {
        Self {
            status: 200,
            body: Bytes::from(value.to_string()),
            source,
        }
    }
}

/// Requests the pipeline refuses to serve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// Missing or wrong service credential.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Unknown route, unsupported method or invalid parameters.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// Upstream gave no answer.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[from] TransportError),
}

// =============================================================================
// Service
// =============================================================================

/// The request pipeline.
pub struct ProxyService<U, L>
where
    U: UpstreamPort,
    L: FailureLogPort,
{
    forwarder: Forwarder<U, L>,
    policy: OrderPolicy,
}

impl<U, L> ProxyService<U, L>
where
    U: UpstreamPort,
    L: FailureLogPort,
{
    /// Create a new `ProxyService`.
    pub const fn new(forwarder: Forwarder<U, L>, policy: OrderPolicy) -> Self {
        Self { forwarder, policy }
    }

    /// Order policy in force.
    pub const fn policy(&self) -> OrderPolicy {
        self.policy
    }

    /// Serve one authenticated request.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::NotFound` for anything outside the supported
    /// surface and `ProxyError::UpstreamUnreachable` when a forwarded call
    /// got no answer.
    pub async fn handle(&self, request: &ProxyRequest) -> Result<ProxyReply, ProxyError> {
        let method = HttpMethod::parse(&request.method)
            .ok_or(ProxyError::NotFound("unsupported method"))?;
        let action = Action::resolve(method, request.action.trim())
            .ok_or(ProxyError::NotFound("unknown action"))?;

        if let GateDecision::Refuse(body) = self.policy.check(action) {
            tracing::info!(%action, "Order action refused by policy");
            return Ok(ProxyReply::local(&body, ReplySource::Policy));
        }

        match action {
            Action::UserAccounts | Action::ListOrders => {
                self.relay(UpstreamCall::new(method, action.path()), request)
                    .await
            }
            Action::PortfolioCurrencies | Action::Portfolio => {
                let account = require_account(&request.query)?;
                let call = UpstreamCall::get(action.path())
                    .with_query("brokerAccountId", account.to_string());
                self.relay(call, request).await
            }
            Action::Orderbook => self.relay(orderbook_call(&request.query), request).await,
            Action::LimitOrder | Action::MarketOrder => {
                let params = request.query.merged(&request.form);
                let call = place_order_call(action, &params, &request.body)?;
                self.relay(call, request).await
            }
            Action::CancelOrder => {
                let call = cancel_order_call(&request.query.merged(&request.form))?;
                self.relay(call, request).await
            }
            Action::Operations => self.operations(request).await,
            Action::PortfolioSummary => self.portfolio_summary(request).await,
        }
    }

    async fn relay(
        &self,
        call: UpstreamCall,
        request: &ProxyRequest,
    ) -> Result<ProxyReply, ProxyError> {
        let response = self.forwarder.forward(&call, &request.uri).await?;
        Ok(ProxyReply::relay(response))
    }

    async fn operations(&self, request: &ProxyRequest) -> Result<ProxyReply, ProxyError> {
        let call = operations_call(&request.query)?;
        let response = self.forwarder.forward(&call, &request.uri).await?;

        if !request.query.contains(CLEAN_COMMISSION_PARAM) {
            return Ok(ProxyReply::relay(response));
        }

        match strip_commissions(&response.body) {
            Ok(cleaned) => Ok(ProxyReply::relay(UpstreamResponse {
                status: response.status,
                body: Bytes::from(cleaned),
            })),
            Err(e) => {
                tracing::warn!(error = %e, "Operations body is not JSON, relaying unchanged");
                Ok(ProxyReply::relay(response))
            }
        }
    }

    async fn portfolio_summary(&self, request: &ProxyRequest) -> Result<ProxyReply, ProxyError> {
        let account = require_account(&request.query)?;
        let account = account.to_string();

        let currencies = self
            .summary_part(
                UpstreamCall::get(Action::PortfolioCurrencies.path())
                    .with_query("brokerAccountId", account.clone()),
                request,
            )
            .await;
        let portfolio = self
            .summary_part(
                UpstreamCall::get(Action::Portfolio.path()).with_query("brokerAccountId", account),
                request,
            )
            .await;

        let summary = json!({
            "currencies": currencies,
            "portfolio": portfolio,
        });
        Ok(ProxyReply::local(&summary, ReplySource::Upstream))
    }

    /// Body of one summary call as text; empty when upstream gave no answer.
    async fn summary_part(&self, call: UpstreamCall, request: &ProxyRequest) -> String {
        self.forwarder
            .forward(&call, &request.uri)
            .await
            .map(|response| String::from_utf8_lossy(&response.body).into_owned())
            .unwrap_or_default()
    }
}

// =============================================================================
// Call Builders
// =============================================================================

fn require_account(query: &Params) -> Result<BrokerAccountId, ProxyError> {
    BrokerAccountId::from_param(query.get("brokerAccountId"))
        .ok_or(ProxyError::NotFound("missing brokerAccountId"))
}

fn orderbook_call(query: &Params) -> UpstreamCall {
    let figi = query.get("figi").unwrap_or_default().trim();
    let depth = OrderbookDepth::from_param(query.get("depth"));

    UpstreamCall::get(Action::Orderbook.path())
        .with_query("figi", figi)
        .with_query("depth", depth.to_string())
}

fn place_order_call(
    action: Action,
    params: &Params,
    body: &Bytes,
) -> Result<UpstreamCall, ProxyError> {
    let figi = params
        .non_blank("figi")
        .ok_or(ProxyError::NotFound("missing figi"))?;
    let account = params
        .non_blank("brokerAccountId")
        .ok_or(ProxyError::NotFound("missing brokerAccountId"))?;

    let call = UpstreamCall::post(action.path())
        .with_query("figi", figi.trim())
        .with_query("brokerAccountId", parse_leading_int(account).to_string());

    Ok(if body.is_empty() {
        call
    } else {
        call.with_body(body.clone())
    })
}

fn cancel_order_call(params: &Params) -> Result<UpstreamCall, ProxyError> {
    let order_id = params
        .non_blank("orderId")
        .ok_or(ProxyError::NotFound("missing orderId"))?;

    Ok(UpstreamCall::post(Action::CancelOrder.path()).with_query("orderId", order_id.trim()))
}

fn operations_call(query: &Params) -> Result<UpstreamCall, ProxyError> {
    let account = require_account(query)?;
    let from = canonical_timestamp(query, "from")?;
    let to = canonical_timestamp(query, "to")?;

    let call = UpstreamCall::get(Action::Operations.path())
        .with_query("brokerAccountId", account.to_string())
        .with_query("from", from.as_str())
        .with_query("to", to.as_str());

    Ok(match query.non_blank("figi") {
        Some(figi) => call.with_query("figi", figi.trim()),
        None => call,
    })
}

fn canonical_timestamp(query: &Params, key: &str) -> Result<CanonicalTimestamp, ProxyError> {
    query
        .non_blank(key)
        .and_then(CanonicalTimestamp::parse)
        .ok_or(ProxyError::NotFound("invalid period"))
}

// =============================================================================
// Tests
// =============================================================================
