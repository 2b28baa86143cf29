//! Bound endpoint routes.
//!
//! A route is the frozen configuration of an endpoint plus a type-erased
//! handler closure created at bind time. Request handling order:
//! auth gate, empty-body check (body verbs only), decode, handler, assemble.

use super::types::{EndpointError, IntoReply, RouteKey};
use crate::auth::{AuthOutcome, AuthValidator};
use crate::body::{BodyError, BodyType, Charset, EndpointSettings};
use crate::request::InboundRequest;
use crate::response::{plain_response, ResponseAssembler};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Response, StatusCode};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error};

pub(crate) type RouteHandler = Box<
    dyn Fn(&InboundRequest, &EndpointConfig) -> Result<Response<Full<Bytes>>, EndpointError>
        + Send
        + Sync,
>;

/// Endpoint configuration accumulated by the builder and frozen on bind.
#[derive(Clone)]
pub struct EndpointConfig {
    pub(crate) path: String,
    pub(crate) request_body_type: BodyType,
    pub(crate) response_body_type: BodyType,
    pub(crate) default_error_status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) auth: Option<AuthValidator>,
    pub(crate) charset: Charset,
    pub(crate) settings: EndpointSettings,
}

impl EndpointConfig {
    pub(crate) fn new(path: impl Into<String>, settings: EndpointSettings) -> Self {
        Self {
            path: path.into(),
            request_body_type: BodyType::Json,
            response_body_type: BodyType::Json,
            default_error_status: StatusCode::UNAUTHORIZED,
            headers: HeaderMap::new(),
            auth: None,
            charset: Charset::Utf8,
            settings,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_body_type(&self) -> BodyType {
        self.request_body_type
    }

    pub fn response_body_type(&self) -> BodyType {
        self.response_body_type
    }

    pub fn default_error_status(&self) -> StatusCode {
        self.default_error_status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    pub(crate) fn assembler(&self) -> ResponseAssembler<'_> {
        ResponseAssembler {
            headers: &self.headers,
            default_body_type: self.response_body_type,
            charset: self.charset,
            settings: &self.settings,
        }
    }

    /// Evaluate the auth gate. `None` when no validator is configured.
    pub(crate) fn authorize(&self, request: &InboundRequest) -> Option<AuthOutcome> {
        self.auth.as_ref().map(|validator| validator(request))
    }

    pub(crate) fn reply<R: IntoReply>(
        &self,
        reply: R,
    ) -> Result<Response<Full<Bytes>>, EndpointError> {
        let reply = reply.into_reply()?;
        let payload =
            serde_json::to_value(&reply.body).map_err(|e| BodyError::Codec(e.into()))?;
        Ok(self
            .assembler()
            .assemble(&payload, reply.status, reply.body_type)?)
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("path", &self.path)
            .field("request_body_type", &self.request_body_type)
            .field("response_body_type", &self.response_body_type)
            .field("default_error_status", &self.default_error_status)
            .field("headers", &self.headers)
            .field("auth", &self.auth.is_some())
            .field("charset", &self.charset)
            .finish()
    }
}

/// One (method, path) binding registered on a server.
pub struct EndpointRoute {
    key: RouteKey,
    config: EndpointConfig,
    reads_body: bool,
    handler: RouteHandler,
}

impl EndpointRoute {
    pub(crate) fn new(
        key: RouteKey,
        config: EndpointConfig,
        reads_body: bool,
        handler: RouteHandler,
    ) -> Self {
        Self {
            key,
            config,
            reads_body,
            handler,
        }
    }

    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Whether the request body is collected for this route. False for GET
    /// and DELETE.
    pub fn reads_body(&self) -> bool {
        self.reads_body
    }

    /// Serve one request. Never fails: errors and handler panics become 500.
    pub fn respond(&self, request: &InboundRequest) -> Response<Full<Bytes>> {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.dispatch(request)))
            .unwrap_or_else(|panic| Err(EndpointError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(response) => {
                debug!("{} -> {}", self.key, response.status());
                response
            }
            Err(e) => {
                error!("{} failed: {}", self.key, e);
                plain_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }

    fn dispatch(&self, request: &InboundRequest) -> Result<Response<Full<Bytes>>, EndpointError> {
        if let Some(outcome) = self.config.authorize(request) {
            if !outcome.authorized {
                debug!("{} rejected by auth gate", self.key);
                return Ok(self.config.assembler().assemble(
                    &outcome.error,
                    self.config.default_error_status,
                    Some(outcome.body_type),
                )?);
            }
        }

        (self.handler)(request, &self.config)
    }
}

impl fmt::Debug for EndpointRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRoute")
            .field("key", &self.key)
            .field("config", &self.config)
            .field("reads_body", &self.reads_body)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
