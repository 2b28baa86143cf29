use bytes::Bytes;
use http_body_util::Full;
use hyper::header::CONTENT_TYPE;
use hyper::http::HeaderValue;
use hyper::{HeaderMap, Response, StatusCode};

/// Low-level response builder. Headers added through `merge_headers`
/// append, `content_type` replaces.
pub struct ResponseBuilder {
    status: StatusCode,
    body: Option<Bytes>,
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn new(status_code: StatusCode) -> Self {
        ResponseBuilder {
            status: status_code,
            body: None,
            headers: Default::default(),
        }
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn merge_headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.headers.append(name, value.clone());
        }
        self
    }

    /// Set `Content-Type`, dropping any value merged earlier.
    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    pub fn build_full(self) -> Response<Full<Bytes>> {
        let payload = self.body.unwrap_or_default();
        let mut response = Response::new(Full::new(payload));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
