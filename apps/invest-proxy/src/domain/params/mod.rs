//! Request Parameters
//!
//! The consumer sends untyped query (and sometimes form) parameters. The
//! rules here decide which values count as present, how integers are read and
//! which timestamps are accepted:
//!
//! - a value is *blank* when it is empty or exactly `"0"`;
//! - integers are read from an optional sign and leading digits, anything
//!   else reads as 0;
//! - timestamps must already be in canonical `YYYY-MM-DDTHH:MM:SS±HH:MM` form.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Timelike};

/// Canonical ISO-8601 layout, e.g. `2021-06-01T00:00:00+03:00`.
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Smallest order book depth forwarded upstream.
pub const MIN_ORDERBOOK_DEPTH: i64 = 1;

/// Largest order book depth forwarded upstream.
pub const MAX_ORDERBOOK_DEPTH: i64 = 20;

/// A flat parameter set. When a key repeats, the last value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    /// Empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs in wire order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Raw value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of `key` unless it is missing or blank.
    #[must_use]
    pub fn non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !is_blank(v))
    }

    /// Whether `key` was sent at all, with any value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set `key`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// A copy of `self` with every entry of `overlay` applied on top.
    #[must_use]
    pub fn merged(&self, overlay: &Self) -> Self {
        let mut merged = self.clone();
        for (k, v) in &overlay.0 {
            merged.0.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters were sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Empty string or `"0"`.
#[must_use]
pub fn is_blank(value: &str) -> bool {
    value.is_empty() || value == "0"
}

/// Read an integer from the leading sign and digits of `value`.
///
/// Leading whitespace is skipped and trailing garbage ignored. Values with
/// no leading digits read as 0; values out of range saturate.
#[must_use]
pub fn parse_leading_int(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return 0;
    }

    match digits.parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    }
}

/// Brokerage sub-account selected by the consumer. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrokerAccountId(i64);

impl BrokerAccountId {
    /// Account context from a raw `brokerAccountId` value.
    ///
    /// Returns `None` when the value is missing, blank, or reads as 0.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Option<Self> {
        value
            .filter(|v| !is_blank(v))
            .map(parse_leading_int)
            .filter(|&id| id != 0)
            .map(Self)
    }

    /// Numeric identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BrokerAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order book depth clamped into `[MIN_ORDERBOOK_DEPTH, MAX_ORDERBOOK_DEPTH]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderbookDepth(i64);

impl OrderbookDepth {
    /// Depth from a raw `depth` value; missing or unreadable means 1.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        let requested = value.map_or(0, parse_leading_int);
        Self(requested.clamp(MIN_ORDERBOOK_DEPTH, MAX_ORDERBOOK_DEPTH))
    }

    /// Clamped depth.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderbookDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A timestamp that is already in canonical ISO-8601 form.
///
/// Acceptance is a strict round trip: the value must parse with
/// [`CANONICAL_TIMESTAMP_FORMAT`] and format back to the identical string.
/// `Z` suffixes, fractional seconds, missing seconds and date-only values
/// are rejected even though they name a valid instant. A leap second (`:60`)
/// is rejected too; it normalizes to the next minute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTimestamp(String);

impl CanonicalTimestamp {
    /// Validate `value`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let parsed = DateTime::parse_from_str(value, CANONICAL_TIMESTAMP_FORMAT)
            .ok()
            .filter(|parsed| parsed.nanosecond() < 1_000_000_000)?;
        let canonical = parsed.format(CANONICAL_TIMESTAMP_FORMAT).to_string();
        (canonical == value).then_some(Self(canonical))
    }

    /// Canonical text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
