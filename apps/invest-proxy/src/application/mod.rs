//! Application Layer - Use cases and port definitions.
//!
//! The request pipeline (route, gate, validate, forward) and the interfaces
//! it needs from the outside world.

/// Port interfaces for the brokerage API and the failure log.
pub mod ports;

/// Request handling and upstream forwarding services.
pub mod services;
