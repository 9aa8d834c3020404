//! Domain Layer - Actions, parameter rules and gate policy.
//!
//! Pure types with no I/O. Everything here is request-scoped except the
//! order policy, which is fixed at startup.

/// Supported logical actions and the `(method, action)` routing table.
pub mod action;

/// Operations-list post-processing (commission removal).
pub mod operations;

/// Lenient parameter parsing (account context, depth, timestamps).
pub mod params;

/// Order feature gate and its canned responses.
pub mod policy;

/// Upstream call/response types and failure classification.
pub mod upstream;
