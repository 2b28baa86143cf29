//! Declarative endpoint definitions.
//!
//! Each entry maps onto one `EndpointBuilder` chain with a static handler,
//! or an echo handler for body-carrying verbs.

use crate::body::BodyType;
use crate::server::MockServer;
use anyhow::Context;
use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    pub path: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_status")]
    pub status: u16,
    /// Static response payload. Absent or null sends no body.
    #[serde(default)]
    pub body: Value,
    /// Request and response body type.
    #[serde(default)]
    pub body_type: BodyType,
    /// Overrides `body_type` for decoding requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body_type: Option<BodyType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_error_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer: Option<BearerSpec>,
    /// Answer with the decoded request body instead of `body`.
    #[serde(default)]
    pub echo: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BearerSpec {
    pub token: String,
    #[serde(default)]
    pub error: Value,
    #[serde(default)]
    pub body_type: BodyType,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}

impl EndpointSpec {
    pub fn method(&self) -> Result<Method, anyhow::Error> {
        match self.method.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            other => anyhow::bail!(
                "Unsupported method '{}' for endpoint '{}'. Supported: GET, POST, PUT, PATCH, DELETE",
                other,
                self.path
            ),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.path.is_empty() {
            anyhow::bail!("Endpoint path must not be empty");
        }
        if !self.path.starts_with('/') {
            anyhow::bail!("Endpoint path '{}' must start with '/'", self.path);
        }
        let method = self.method()?;
        status_code(self.status)
            .with_context(|| format!("Invalid status for endpoint '{}'", self.path))?;
        if let Some(status) = self.default_error_status {
            status_code(status)
                .with_context(|| format!("Invalid defaultErrorStatus for '{}'", self.path))?;
        }
        if self.echo && (method == Method::GET || method == Method::DELETE) {
            anyhow::bail!(
                "Endpoint '{} {}' cannot echo: {} requests carry no body",
                method,
                self.path,
                method
            );
        }
        Ok(())
    }

    /// Declare this endpoint on `server`.
    pub fn register(&self, server: &MockServer) -> Result<(), anyhow::Error> {
        let method = self.method()?;
        let status = status_code(self.status)?;
        let body_type = self.body_type;

        let mut builder = server
            .endpoint(self.path.clone())
            .with_default_body_type(self.body_type)
            .with_response_headers(&self.headers);

        if let Some(request_body_type) = self.request_body_type {
            builder = builder.with_request_body_type(request_body_type);
        }
        if let Some(error_status) = self.default_error_status {
            builder = builder.with_default_error_status_code(status_code(error_status)?);
        }
        if let Some(bearer) = &self.bearer {
            builder = builder.require_bearer(
                bearer.token.clone(),
                bearer.error.clone(),
                bearer.body_type,
            );
        }

        let body = self.body.clone();
        match method {
            Method::GET => {
                builder.on_get(move || (body.clone(), status, Some(body_type)));
            }
            Method::DELETE => {
                builder.on_delete(move || (body.clone(), status, Some(body_type)));
            }
            Method::POST | Method::PUT | Method::PATCH => {
                let echo = self.echo;
                let handler = move |input: Value| {
                    let payload = if echo { input } else { body.clone() };
                    (payload, status, Some(body_type))
                };
                if method == Method::POST {
                    builder.on_post(handler);
                } else if method == Method::PUT {
                    builder.on_put(handler);
                } else {
                    builder.on_patch(handler);
                }
            }
            other => anyhow::bail!("Unsupported method '{}'", other),
        }
        Ok(())
    }
}

fn status_code(code: u16) -> Result<StatusCode, anyhow::Error> {
    StatusCode::from_u16(code).map_err(|_| anyhow::anyhow!("{} is not a valid status code", code))
}
