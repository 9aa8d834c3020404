//! Tinkoff Invest Adapter
//!
//! Implements `UpstreamPort` against the Tinkoff Invest OpenAPI REST
//! interface using `reqwest`. No retries and no request timeout: a call
//! either gets an answer or fails with `TransportError`.

mod client;

pub use client::TinkoffHttpClient;
