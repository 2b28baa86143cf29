//! Type definitions shared by endpoint builders and routes.

use crate::body::{BodyError, BodyType};
use hyper::{Method, StatusCode};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Errors
// ============================================================================

/// Failures while serving a request on a bound endpoint. Every variant is
/// answered with a 500 by the route.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error(transparent)]
    Body(#[from] BodyError),
    #[error("Handler failed: {0}")]
    Handler(#[source] anyhow::Error),
    #[error("Handler panicked: {0}")]
    Panicked(String),
}

// ============================================================================
// Route identity
// ============================================================================

/// Exact (method, path) pair a route answers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

// ============================================================================
// Handler results
// ============================================================================

/// What a handler returns: a payload, a status and an optional body type
/// overriding the endpoint's response body type.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub body: T,
    pub status: StatusCode,
    pub body_type: Option<BodyType>,
}

impl<T> Reply<T> {
    pub fn new(body: T, status: StatusCode) -> Self {
        Self {
            body,
            status,
            body_type: None,
        }
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = Some(body_type);
        self
    }
}

/// Conversion from a handler's return value into a [`Reply`].
///
/// Implemented for `Reply<T>`, `(T, StatusCode, Option<BodyType>)`,
/// `(T, StatusCode)` and `Result<R, E>` of any of those, so handlers can be
/// fallible. A payload serializing to null (`None`, `()`) sends no body.
pub trait IntoReply {
    type Body: Serialize;

    fn into_reply(self) -> Result<Reply<Self::Body>, EndpointError>;
}

impl<T: Serialize> IntoReply for Reply<T> {
    type Body = T;

    fn into_reply(self) -> Result<Reply<T>, EndpointError> {
        Ok(self)
    }
}

impl<T: Serialize> IntoReply for (T, StatusCode, Option<BodyType>) {
    type Body = T;

    fn into_reply(self) -> Result<Reply<T>, EndpointError> {
        let (body, status, body_type) = self;
        Ok(Reply {
            body,
            status,
            body_type,
        })
    }
}

impl<T: Serialize> IntoReply for (T, StatusCode) {
    type Body = T;

    fn into_reply(self) -> Result<Reply<T>, EndpointError> {
        Ok(Reply::new(self.0, self.1))
    }
}

impl<R, E> IntoReply for Result<R, E>
where
    R: IntoReply,
    E: Into<anyhow::Error>,
{
    type Body = R::Body;

    fn into_reply(self) -> Result<Reply<R::Body>, EndpointError> {
        self.map_err(|e| EndpointError::Handler(e.into()))?
            .into_reply()
    }
}
