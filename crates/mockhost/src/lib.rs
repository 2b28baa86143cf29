//! Programmable HTTP mock server.
//!
//! A [`MockServer`] listens on a TCP port and answers requests with routes
//! declared through [`EndpointBuilder`]: one route per exact (method, path),
//! each with its own body encodings, response headers, auth gate and typed
//! handler.

pub mod auth;
pub mod body;
pub mod config;
pub mod endpoint;
pub mod request;
pub mod response;
pub mod server;

pub use auth::AuthOutcome;
pub use body::{BodyError, BodyType, Charset, EndpointSettings};
pub use config::{ListenConfig, MockHostConfig};
pub use endpoint::{EndpointBuilder, EndpointError, IntoReply, Reply};
pub use hyper::StatusCode;
pub use request::InboundRequest;
pub use server::{MockResource, MockServer, ResourceSnapshot, ResourceState, ServerError};
