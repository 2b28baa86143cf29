//! Response materialization for endpoint routes.
//!
//! `ResponseAssembler` turns a (payload, status, body type) triple into a
//! hyper response: custom headers first, then the encoded body, then a
//! `Content-Type` matching the encoding actually used.

mod builder;

pub use builder::ResponseBuilder;

use crate::body::{codec, BodyError, BodyType, Charset, EndpointSettings};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Response, StatusCode};
use serde_json::Value;

/// Borrowed view of the endpoint configuration needed to build responses.
pub struct ResponseAssembler<'a> {
    pub headers: &'a HeaderMap,
    pub default_body_type: BodyType,
    pub charset: Charset,
    pub settings: &'a EndpointSettings,
}

impl ResponseAssembler<'_> {
    /// Build a response. A `None` body type falls back to the endpoint's
    /// response body type; a null payload produces no body and no
    /// `Content-Type`.
    pub fn assemble(
        &self,
        payload: &Value,
        status: StatusCode,
        body_type: Option<BodyType>,
    ) -> Result<Response<Full<Bytes>>, BodyError> {
        let body_type = body_type.unwrap_or(self.default_body_type);
        let builder = ResponseBuilder::new(status).merge_headers(self.headers);

        let response = match codec::encode(payload, body_type, self.charset, self.settings)? {
            Some(encoded) => builder
                .body(encoded.bytes)
                .content_type(encoded.content_type),
            None => builder,
        };
        Ok(response.build_full())
    }

    /// Response with custom headers and no body.
    pub fn empty(&self, status: StatusCode) -> Response<Full<Bytes>> {
        ResponseBuilder::new(status)
            .merge_headers(self.headers)
            .build_full()
    }
}

/// Plain-text response outside any endpoint (404, 500).
pub fn plain_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    ResponseBuilder::new(status)
        .body(body)
        .content_type("text/plain")
        .build_full()
}

/// JSON response outside any endpoint.
pub fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    ResponseBuilder::new(status)
        .body(body.to_string())
        .content_type("application/json")
        .build_full()
}
