//! Configuration Module
//!
//! Configuration loading for the proxy service.

mod settings;

pub use settings::{
    ConfigError, Credentials, DEFAULT_FAILURE_LOG, DEFAULT_UPSTREAM_URL, ProxyConfig,
    ServerSettings,
};
