//! Endpoint configuration and per-route request handling.
//!
//! This module provides:
//! - `EndpointBuilder`: fluent configuration, consumed by a verb handler
//! - `EndpointRoute`: the bound (method, path) route and its dispatch
//! - `IntoReply`/`Reply`: what handlers return
//! - `EndpointError`: failures answered with a 500
//!
//! ## Module Structure
//!
//! - `types`: errors, route keys, reply conversion
//! - `route`: frozen configuration and request dispatch
//! - `builder`: the fluent builder and verb methods

mod builder;
mod route;
mod types;

#[cfg(test)]
mod tests;

pub use builder::EndpointBuilder;
pub use route::{EndpointConfig, EndpointRoute};
pub use types::{EndpointError, IntoReply, Reply, RouteKey};
