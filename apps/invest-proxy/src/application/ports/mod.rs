//! Port Interfaces
//!
//! Driven ports the request pipeline depends on. Infrastructure adapters
//! implement them; tests substitute in-memory versions.
//!
//! - `UpstreamPort`: a single authenticated call to the brokerage API
//! - `FailureLogPort`: append-only sink for failure records

mod failure_log_port;
mod upstream_port;

pub use failure_log_port::{FailureLogError, FailureLogPort, InMemoryFailureLog};
pub use upstream_port::{TransportError, UpstreamPort};

#[cfg(test)]
pub use upstream_port::stub::StubUpstream;
