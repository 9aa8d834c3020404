//! Upstream Calls and Failures
//!
//! What the proxy asks of the brokerage API, what comes back, and how an
//! unsuccessful answer is classified and described in the failure log.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::action::HttpMethod;

/// Format of the timestamp at the start of each failure record.
pub const FAILURE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Call / Response
// =============================================================================

/// One request to issue against the brokerage API.
///
/// The trading credential is not part of the call; the transport attaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamCall {
    /// Path below the upstream base URL, e.g. `/portfolio`.
    pub path: &'static str,
    /// Request method.
    pub method: HttpMethod,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
    /// Raw request body, forwarded verbatim.
    pub body: Option<Bytes>,
}

impl UpstreamCall {
    /// Call with no parameters and no body.
    #[must_use]
    pub const fn new(method: HttpMethod, path: &'static str) -> Self {
        Self {
            path,
            method,
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET` call.
    #[must_use]
    pub const fn get(path: &'static str) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `POST` call.
    #[must_use]
    pub const fn post(path: &'static str) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a raw body.
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first query parameter named `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of an upstream answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body bytes exactly as received.
    pub body: Bytes,
}

// =============================================================================
// Classification
// =============================================================================

/// Category of an unsuccessful upstream answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorKind {
    /// 401: the trading credential was refused.
    AuthorizationError,
    /// 429: upstream rate limit hit.
    TooManyRequests,
    /// 500: typically an order the brokerage will not accept.
    OrderNotAvailable,
    /// Any other status, or no status at all.
    UnknownError,
}

impl UpstreamErrorKind {
    /// Classify a status code. 200 is not an error.
    #[must_use]
    pub const fn classify(status: u16) -> Option<Self> {
        match status {
            200 => None,
            401 => Some(Self::AuthorizationError),
            429 => Some(Self::TooManyRequests),
            500 => Some(Self::OrderNotAvailable),
            _ => Some(Self::UnknownError),
        }
    }

    /// Human-readable message written to the failure log.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AuthorizationError => "Authorization error",
            Self::TooManyRequests => "Too Many Requests",
            Self::OrderNotAvailable => "Order Not Available (500)",
            Self::UnknownError => "Unknown error",
        }
    }

    /// Metric label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AuthorizationError => "authorization_error",
            Self::TooManyRequests => "too_many_requests",
            Self::OrderNotAvailable => "order_not_available",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// =============================================================================
// Failure Record
// =============================================================================

/// Diagnostic record of one unsuccessful upstream call.
///
/// `Display` renders the plain-text block appended to the failure log:
///
/// ```text
/// 2021-06-15 10:00:00 / /?action=/portfolio / 500 /  / Order Not Available (500) / https://.../portfolio
/// params: brokerAccountId=2000123456
/// return: {"status":"Error"}
///
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// When the failure was observed.
    pub timestamp: DateTime<Utc>,
    /// Inbound request URI as the consumer sent it.
    pub request_uri: String,
    /// Upstream status, 0 when no answer was received.
    pub status: u16,
    /// Transport error text, empty when upstream answered.
    pub transport_error: String,
    /// Classification of the failure.
    pub kind: UpstreamErrorKind,
    /// Full upstream URL without the query string.
    pub url: String,
    /// Query parameters that were sent.
    pub params: Vec<(String, String)>,
    /// Request body that was sent.
    pub body: Option<Bytes>,
    /// Raw upstream answer, lossily decoded.
    pub response: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} / {} / {} / {} / {} / {}",
            self.timestamp.format(FAILURE_TIMESTAMP_FORMAT),
            self.request_uri,
            self.status,
            self.transport_error,
            self.kind.message(),
            self.url,
        )?;

        if !self.params.is_empty() {
            let rendered: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            writeln!(f, "params: {}", rendered.join(", "))?;
        }

        if let Some(body) = self.body.as_ref().filter(|b| !b.is_empty()) {
            writeln!(f, "postFields: {}", String::from_utf8_lossy(body))?;
        }

        write!(f, "return: {}\n\n", self.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case(401, UpstreamErrorKind::AuthorizationError ; "unauthorized")]
    #[test_case(429, UpstreamErrorKind::TooManyRequests ; "rate limited")]
    #[test_case(500, UpstreamErrorKind::OrderNotAvailable ; "server error")]
    #[test_case(404, UpstreamErrorKind::UnknownError ; "not found")]
    #[test_case(503, UpstreamErrorKind::UnknownError ; "unavailable")]
    #[test_case(0, UpstreamErrorKind::UnknownError ; "no status")]
    fn classifies_failures(status: u16, expected: UpstreamErrorKind) {
        assert_eq!(UpstreamErrorKind::classify(status), Some(expected));
    }

    #[test]
    fn ok_is_not_a_failure() {
        assert_eq!(UpstreamErrorKind::classify(200), None);
    }

    #[test]
    fn builder_keeps_query_order() {
        let call = UpstreamCall::get("/market/orderbook")
            .with_query("figi", "BBG000B9XRY4")
            .with_query("depth", "5");

        assert_eq!(
            call.query,
            vec![
                ("figi".to_string(), "BBG000B9XRY4".to_string()),
                ("depth".to_string(), "5".to_string()),
            ]
        );
        assert_eq!(call.query_value("depth"), Some("5"));
        assert_eq!(call.query_value("missing"), None);
        assert!(call.body.is_none());
    }

    fn sample_record() -> FailureRecord {
        FailureRecord {
            timestamp: Utc.with_ymd_and_hms(2021, 6, 15, 10, 30, 0).unwrap(),
            request_uri: "/?action=/orders/limit-order&brokerAccountId=7".to_string(),
            status: 500,
            transport_error: String::new(),
            kind: UpstreamErrorKind::OrderNotAvailable,
            url: "https://api-invest.tinkoff.ru/openapi/orders/limit-order".to_string(),
            params: vec![
                ("figi".to_string(), "BBG000B9XRY4".to_string()),
                ("brokerAccountId".to_string(), "7".to_string()),
            ],
            body: Some(Bytes::from_static(br#"{"lots":1}"#)),
            response: r#"{"status":"Error"}"#.to_string(),
        }
    }

    #[test]
    fn renders_full_record() {
        assert_eq!(
            sample_record().to_string(),
            "2021-06-15 10:30:00 / /?action=/orders/limit-order&brokerAccountId=7 / 500 /  / \
             Order Not Available (500) / https://api-invest.tinkoff.ru/openapi/orders/limit-order\n\
             params: figi=BBG000B9XRY4, brokerAccountId=7\n\
             postFields: {\"lots\":1}\n\
             return: {\"status\":\"Error\"}\n\n"
        );
    }

    #[test]
    fn omits_empty_sections() {
        let record = FailureRecord {
            status: 0,
            transport_error: "connection refused".to_string(),
            kind: UpstreamErrorKind::UnknownError,
            params: Vec::new(),
            body: Some(Bytes::new()),
            response: String::new(),
            ..sample_record()
        };

        let text = record.to_string();
        assert!(text.contains(" / 0 / connection refused / Unknown error / "));
        assert!(!text.contains("params:"));
        assert!(!text.contains("postFields:"));
        assert!(text.ends_with("\nreturn: \n\n"));
    }
}
