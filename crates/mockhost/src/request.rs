//! Inbound request view handed to auth validators and route dispatch.

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method};

/// An inbound request with its body already collected.
///
/// GET and DELETE routes never read the body, so `body` is empty for them
/// regardless of what the client sent.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header, if present and valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// True when the body is empty or only whitespace. Bodies that are not
    /// UTF-8 fall back to an ASCII whitespace check.
    pub fn body_is_blank(&self) -> bool {
        match std::str::from_utf8(&self.body) {
            Ok(text) => text.trim().is_empty(),
            Err(_) => self.body.iter().all(u8::is_ascii_whitespace),
        }
    }
}
