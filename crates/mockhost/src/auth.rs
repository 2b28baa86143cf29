//! Authentication gate run before an endpoint's handler.
//!
//! An endpoint holds zero or one validator. A rejection short-circuits the
//! route: the handler and the body decoder never run, and the response is
//! built from the outcome's error payload with the endpoint's default error
//! status code.

use crate::body::BodyType;
use crate::request::InboundRequest;
use hyper::header::AUTHORIZATION;
use serde_json::Value;
use std::sync::Arc;

/// Validator stored on an endpoint.
pub type AuthValidator = Arc<dyn Fn(&InboundRequest) -> AuthOutcome + Send + Sync>;

/// Result of evaluating an auth validator.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub authorized: bool,
    /// Error payload; `Value::Null` sends no body.
    pub error: Value,
    pub body_type: BodyType,
}

impl AuthOutcome {
    pub fn allow() -> Self {
        Self {
            authorized: true,
            error: Value::Null,
            body_type: BodyType::Json,
        }
    }

    pub fn deny(error: impl Into<Value>, body_type: BodyType) -> Self {
        Self {
            authorized: false,
            error: error.into(),
            body_type,
        }
    }
}

impl From<(bool, Value, BodyType)> for AuthOutcome {
    fn from((authorized, error, body_type): (bool, Value, BodyType)) -> Self {
        Self {
            authorized,
            error,
            body_type,
        }
    }
}

impl From<bool> for AuthOutcome {
    fn from(authorized: bool) -> Self {
        Self {
            authorized,
            ..Self::allow()
        }
    }
}

/// Validator accepting only `Authorization: Bearer {token}`.
///
/// Only the first `Authorization` value is inspected.
pub fn bearer(token: impl Into<String>, error: Value, body_type: BodyType) -> AuthValidator {
    let token = token.into();
    Arc::new(move |request: &InboundRequest| {
        let presented = request
            .header(AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix("Bearer "));

        if presented == Some(token.as_str()) {
            AuthOutcome {
                body_type,
                ..AuthOutcome::allow()
            }
        } else {
            AuthOutcome::deny(error.clone(), body_type)
        }
    })
}

/// Wrap a caller-supplied predicate as a validator.
pub fn custom<F, O>(validator: F) -> AuthValidator
where
    F: Fn(&InboundRequest) -> O + Send + Sync + 'static,
    O: Into<AuthOutcome>,
{
    Arc::new(move |request: &InboundRequest| validator(request).into())
}
