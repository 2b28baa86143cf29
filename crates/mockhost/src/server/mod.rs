//! HTTP server lifecycle.
//!
//! This module provides:
//! - `MockServer`: binds a port, owns the route table, serves requests
//! - `MockResource`: named wrapper with state tracking for orchestration
//! - `ServerError`: bind failures
//!
//! ## Module Structure
//!
//! - `core`: listener, accept loop and route registration
//! - `handler`: hyper request to route dispatch
//! - `resource`: resource lifecycle
//! - `types`: errors, states and snapshots

mod core;
mod handler;
mod resource;
mod types;

pub use self::core::MockServer;
pub use resource::MockResource;
pub use types::{ResourceSnapshot, ResourceState, ServerError};
