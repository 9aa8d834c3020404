//! Application Services
//!
//! - `ProxyService`: the per-request pipeline (route, gate, validate, forward)
//! - `Forwarder`: single-attempt upstream call with failure logging

mod forwarder;
mod proxy;

pub use forwarder::Forwarder;
pub use proxy::{
    CLEAN_COMMISSION_PARAM, ProxyError, ProxyReply, ProxyRequest, ProxyService, ReplySource,
};
