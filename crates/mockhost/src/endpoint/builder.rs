//! Fluent endpoint configuration.

use super::route::{EndpointConfig, EndpointRoute, RouteHandler};
use super::types::{IntoReply, RouteKey};
use crate::auth::{self, AuthOutcome};
use crate::body::{codec, BodyType, Charset, EndpointSettings};
use crate::request::InboundRequest;
use crate::server::MockServer;
use hyper::http::{HeaderName, HeaderValue};
use hyper::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Builder for one endpoint path on a [`MockServer`].
///
/// Configuration calls return the builder; the verb methods (`on_get`,
/// `on_post`, ...) consume it and register the route, so a builder is bound
/// at most once. Clone the builder to bind the same configuration to
/// several verbs.
///
/// ```no_run
/// # async fn demo() -> Result<(), mockhost::ServerError> {
/// use mockhost::{BodyType, MockServer, StatusCode};
///
/// let server = MockServer::start(0).await?;
/// server
///     .endpoint("/api/test")
///     .with_response_body_type(BodyType::PlainText)
///     .on_get(|| ("Aspire GET OK", StatusCode::OK, None));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct EndpointBuilder<'a> {
    server: &'a MockServer,
    config: EndpointConfig,
}

impl<'a> EndpointBuilder<'a> {
    pub(crate) fn new(
        server: &'a MockServer,
        path: impl Into<String>,
        settings: EndpointSettings,
    ) -> Self {
        Self {
            server,
            config: EndpointConfig::new(path, settings),
        }
    }

    /// Encoding used to decode request bodies.
    pub fn with_request_body_type(mut self, body_type: BodyType) -> Self {
        self.config.request_body_type = body_type;
        self
    }

    /// Encoding used for responses when the handler does not pick one.
    pub fn with_response_body_type(mut self, body_type: BodyType) -> Self {
        self.config.response_body_type = body_type;
        self
    }

    /// Set request and response body types together.
    pub fn with_default_body_type(mut self, body_type: BodyType) -> Self {
        self.config.request_body_type = body_type;
        self.config.response_body_type = body_type;
        self
    }

    /// Character encoding for text bodies. Defaults to UTF-8.
    pub fn with_encoding(mut self, charset: Charset) -> Self {
        self.config.charset = charset;
        self
    }

    /// Replace the JSON serialization settings.
    pub fn with_settings(mut self, settings: EndpointSettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Status code sent when the auth gate rejects a request. Defaults to 401.
    pub fn with_default_error_status_code(mut self, status: StatusCode) -> Self {
        self.config.default_error_status = status;
        self
    }

    /// Require `Authorization: Bearer {token}`. `error` is the rejection
    /// payload (`Value::Null` for none), encoded with `body_type`.
    pub fn require_bearer(
        mut self,
        token: impl Into<String>,
        error: impl Into<Value>,
        body_type: BodyType,
    ) -> Self {
        if self.config.auth.is_some() {
            debug!("Replacing auth validator on {}", self.config.path);
        }
        self.config.auth = Some(auth::bearer(token, error.into(), body_type));
        self
    }

    /// Gate the endpoint behind a custom predicate. Replaces any validator
    /// configured earlier.
    pub fn require_custom_auth<F, O>(mut self, validator: F) -> Self
    where
        F: Fn(&InboundRequest) -> O + Send + Sync + 'static,
        O: Into<AuthOutcome>,
    {
        if self.config.auth.is_some() {
            debug!("Replacing auth validator on {}", self.config.path);
        }
        self.config.auth = Some(auth::custom(validator));
        self
    }

    /// Add a response header value. Existing values are kept.
    pub fn with_response_header(mut self, name: &str, value: &str) -> Self {
        self.append_header(name, value);
        self
    }

    /// Add several response header values. Existing values are kept.
    pub fn with_response_headers<I, K, V, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (name, values) in headers {
            for value in values {
                self.append_header(name.as_ref(), value.as_ref());
            }
        }
        self
    }

    fn append_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.config.headers.append(name, value);
            }
            _ => warn!(
                "Ignoring invalid response header {:?}: {:?} on {}",
                name, value, self.config.path
            ),
        }
    }

    // ===== Verb handlers =====

    pub fn on_get<F, R>(self, handler: F) -> &'a MockServer
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        self.bind_without_body(Method::GET, handler)
    }

    pub fn on_delete<F, R>(self, handler: F) -> &'a MockServer
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        self.bind_without_body(Method::DELETE, handler)
    }

    pub fn on_post<Req, F, R>(self, handler: F) -> &'a MockServer
    where
        Req: DeserializeOwned + 'static,
        F: Fn(Req) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        self.bind_with_body(Method::POST, handler)
    }

    pub fn on_put<Req, F, R>(self, handler: F) -> &'a MockServer
    where
        Req: DeserializeOwned + 'static,
        F: Fn(Req) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        self.bind_with_body(Method::PUT, handler)
    }

    pub fn on_patch<Req, F, R>(self, handler: F) -> &'a MockServer
    where
        Req: DeserializeOwned + 'static,
        F: Fn(Req) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        self.bind_with_body(Method::PATCH, handler)
    }

    fn bind_without_body<F, R>(self, method: Method, handler: F) -> &'a MockServer
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        let route_handler: RouteHandler =
            Box::new(move |_: &InboundRequest, config: &EndpointConfig| config.reply(handler()));
        self.bind(method, false, route_handler)
    }

    fn bind_with_body<Req, F, R>(self, method: Method, handler: F) -> &'a MockServer
    where
        Req: DeserializeOwned + 'static,
        F: Fn(Req) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        let route_handler: RouteHandler =
            Box::new(move |request: &InboundRequest, config: &EndpointConfig| {
                if request.body_is_blank() {
                    debug!("{} {} rejected: empty body", request.method, config.path);
                    return Ok(config.assembler().empty(StatusCode::BAD_REQUEST));
                }

                let input: Req = codec::decode(
                    &request.body,
                    config.request_body_type,
                    config.charset,
                    &config.settings,
                )?;
                config.reply(handler(input))
            });
        self.bind(method, true, route_handler)
    }

    fn bind(self, method: Method, reads_body: bool, handler: RouteHandler) -> &'a MockServer {
        let key = RouteKey::new(method, self.config.path.clone());
        self.server
            .register(EndpointRoute::new(key, self.config, reads_body, handler));
        self.server
    }
}
