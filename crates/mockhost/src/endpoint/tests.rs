//! Route dispatch tests, driven through `EndpointRoute::respond` without a
//! client connection.

use crate::auth::AuthOutcome;
use crate::body::{BodyType, Charset, EndpointSettings};
use crate::request::InboundRequest;
use crate::server::MockServer;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

async fn body_text(response: Response<Full<Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn respond(server: &MockServer, request: InboundRequest) -> Response<Full<Bytes>> {
    server
        .route(request.method.clone(), &request.path)
        .expect("route registered")
        .respond(&request)
}

fn content_type(response: &Response<Full<Bytes>>) -> Option<&str> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_plain_text_get() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/test")
        .with_response_body_type(BodyType::PlainText)
        .on_get(|| ("Aspire GET OK", StatusCode::OK, None));

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/test"));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), Some("text/plain"));
    assert_eq!(body_text(response).await, "Aspire GET OK");
}

#[tokio::test]
async fn test_bearer_gate_runs_before_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/secure")
        .with_response_body_type(BodyType::PlainText)
        .require_bearer("mytoken", "Unauthorized", BodyType::PlainText)
        .on_get(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ("Secure GET OK", StatusCode::OK, None)
        });

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/secure"));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Unauthorized");

    let wrong = InboundRequest::new(Method::GET, "/api/secure")
        .with_header("Authorization", "Bearer other");
    assert_eq!(respond(&server, wrong).status(), StatusCode::UNAUTHORIZED);

    let scheme_only =
        InboundRequest::new(Method::GET, "/api/secure").with_header("Authorization", "mytoken");
    assert_eq!(respond(&server, scheme_only).status(), StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let ok = InboundRequest::new(Method::GET, "/api/secure")
        .with_header("Authorization", "Bearer mytoken");
    let response = respond(&server, ok);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Secure GET OK");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_bearer_gate_runs_before_body_checks_on_post() {
    #[derive(Debug, Deserialize)]
    struct Order {
        item: String,
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/orders")
        .require_bearer("mytoken", "Unauthorized", BodyType::PlainText)
        .on_post(move |order: Order| {
            counter.fetch_add(1, Ordering::SeqCst);
            (json!({ "ordered": order.item }), StatusCode::CREATED, None)
        });

    for body in ["", "  ", r#"{"item":"book"}"#, "{not json"] {
        let request = InboundRequest::new(Method::POST, "/api/orders").with_body(body);
        let response = respond(&server, request);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "body {body:?}");
        assert_eq!(content_type(&response), Some("text/plain"));
        assert_eq!(body_text(response).await, "Unauthorized");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let empty = InboundRequest::new(Method::POST, "/api/orders")
        .with_header("Authorization", "Bearer mytoken");
    assert_eq!(respond(&server, empty).status(), StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let valid = InboundRequest::new(Method::POST, "/api/orders")
        .with_header("Authorization", "Bearer mytoken")
        .with_body(r#"{"item":"book"}"#);
    let response = respond(&server, valid);
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_text(response).await, r#"{"ordered":"book"}"#);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_custom_auth_replaces_bearer() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/keyed")
        .with_default_error_status_code(StatusCode::FORBIDDEN)
        .with_response_body_type(BodyType::PlainText)
        .require_bearer("mytoken", "Unauthorized", BodyType::PlainText)
        .require_custom_auth(|request: &InboundRequest| {
            if request.header("X-Key") == Some("k") {
                AuthOutcome::allow()
            } else {
                AuthOutcome::deny("Forbidden", BodyType::PlainText)
            }
        })
        .on_get(|| ("Keyed", StatusCode::OK, None));

    let bearer_only = InboundRequest::new(Method::GET, "/api/keyed")
        .with_header("Authorization", "Bearer mytoken");
    let response = respond(&server, bearer_only);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Forbidden");

    let keyed = InboundRequest::new(Method::GET, "/api/keyed").with_header("X-Key", "k");
    let response = respond(&server, keyed);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Keyed");
}

#[tokio::test]
async fn test_rejection_uses_default_error_status_and_null_error() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/secure")
        .with_default_error_status_code(StatusCode::FORBIDDEN)
        .require_bearer("mytoken", Value::Null, BodyType::Json)
        .on_delete(|| ((), StatusCode::NO_CONTENT, None));

    let response = respond(&server, InboundRequest::new(Method::DELETE, "/api/secure"));
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(content_type(&response).is_none());
    assert_eq!(body_text(response).await, "");
}

#[tokio::test]
async fn test_blank_body_is_bad_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/echo")
        .with_response_header("X-Test", "v1")
        .with_default_body_type(BodyType::PlainText)
        .on_post(move |text: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            (text, StatusCode::OK, None)
        });

    for body in ["", "   ", "\r\n\t"] {
        let request = InboundRequest::new(Method::POST, "/api/echo").with_body(body);
        let response = respond(&server, request);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers().get("x-test").unwrap(), "v1");
        assert!(content_type(&response).is_none());
        assert_eq!(body_text(response).await, "");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_header_values_accumulate() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/headers")
        .with_response_header("X-Test", "v1")
        .with_response_headers([("X-Test", vec!["v2"]), ("X-Other", vec!["v3", "v4"])])
        .with_response_body_type(BodyType::PlainText)
        .on_get(|| ("Headers OK", StatusCode::OK, None));

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/headers"));
    let values = |name: &str| -> Vec<String> {
        response
            .headers()
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(values("x-test"), vec!["v1", "v2"]);
    assert_eq!(values("x-other"), vec!["v3", "v4"]);
}

#[tokio::test]
async fn test_content_type_follows_body_type() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/typed")
        .with_response_header("Content-Type", "application/xml")
        .with_response_body_type(BodyType::PlainText)
        .on_get(|| (json!({"a": 1}), StatusCode::OK, Some(BodyType::Json)));

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/typed"));
    assert_eq!(response.headers().get_all(CONTENT_TYPE).iter().count(), 1);
    assert_eq!(content_type(&response), Some("application/json"));
    assert_eq!(body_text(response).await, r#"{"a":1}"#);
}

#[tokio::test]
async fn test_json_echo() {
    #[derive(Debug, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: u32,
    }

    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/person")
        .on_post(|person: Person| (person, StatusCode::CREATED, None));

    let request = InboundRequest::new(Method::POST, "/api/person")
        .with_body(r#"{ "name": "Ada", "age": 36 }"#);
    let response = respond(&server, request);
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(content_type(&response), Some("application/json"));
    let echoed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(echoed, json!({"name": "Ada", "age": 36}));

    let invalid = InboundRequest::new(Method::POST, "/api/person").with_body("{ not json");
    assert_eq!(
        respond(&server, invalid).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_form_echo() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/form")
        .with_default_body_type(BodyType::FormUrlEncoded)
        .on_post(|form: BTreeMap<String, String>| (form, StatusCode::OK, None));

    let request =
        InboundRequest::new(Method::POST, "/api/form").with_body("name=John+Doe&key=value");
    let response = respond(&server, request);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        content_type(&response),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(body_text(response).await, "key=value&name=John%20Doe");
}

#[tokio::test]
async fn test_form_into_string_is_server_error() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/form")
        .with_request_body_type(BodyType::FormUrlEncoded)
        .on_post(|text: String| (text, StatusCode::OK, None));

    let request = InboundRequest::new(Method::POST, "/api/form").with_body("a=1");
    let response = respond(&server, request);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("formUrlEncoded"));
}

#[tokio::test]
async fn test_unsupported_body_type_is_server_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/unsupported")
        .with_request_body_type(BodyType::Unsupported)
        .on_post(move |text: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            (text, StatusCode::OK, None)
        });
    server
        .endpoint("/api/unsupported-response")
        .on_get(|| ("x", StatusCode::OK, Some(BodyType::Unsupported)));

    let request = InboundRequest::new(Method::POST, "/api/unsupported").with_body("data");
    assert_eq!(
        respond(&server, request).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let request = InboundRequest::new(Method::GET, "/api/unsupported-response");
    assert_eq!(
        respond(&server, request).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_handler_failure_and_panic_are_server_errors() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/fail")
        .on_get(|| -> Result<(&'static str, StatusCode), anyhow::Error> { anyhow::bail!("storage down") });
    server
        .endpoint("/api/panic")
        .on_get(|| -> (&'static str, StatusCode) { panic!("handler exploded") });

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/fail"));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Handler failed: storage down");

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/panic"));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("handler exploded"));
}

#[tokio::test]
async fn test_custom_auth() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/custom")
        .with_default_error_status_code(StatusCode::FORBIDDEN)
        .with_response_body_type(BodyType::PlainText)
        .require_custom_auth(|request: &InboundRequest| {
            if request.header("X-Test") == Some("ok") {
                AuthOutcome::allow()
            } else {
                AuthOutcome::deny("Forbidden", BodyType::PlainText)
            }
        })
        .on_get(|| ("Authorized", StatusCode::OK, None));

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/custom"));
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Forbidden");

    let request = InboundRequest::new(Method::GET, "/api/custom").with_header("x-test", "ok");
    let response = respond(&server, request);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Authorized");
}

#[tokio::test]
async fn test_custom_status() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/teapot")
        .with_response_body_type(BodyType::PlainText)
        .on_get(|| ("I am a teapot", StatusCode::IM_A_TEAPOT, None));

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/teapot"));
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_text(response).await, "I am a teapot");
}

#[tokio::test]
async fn test_latin1_round_trip() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/latin1")
        .with_default_body_type(BodyType::PlainText)
        .with_encoding(Charset::Latin1)
        .on_put(|text: String| (format!("{text}!"), StatusCode::OK, None));

    let request = InboundRequest::new(Method::PUT, "/api/latin1").with_body(vec![0x63, 0x61, 0x66, 0xE9]);
    let response = respond(&server, request);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), &[0x63, 0x61, 0x66, 0xE9, b'!']);
}

#[tokio::test]
async fn test_custom_settings() {
    let settings = EndpointSettings::new().with_serializer(|value: &Value| {
        Ok(format!("<<{}>>", serde_json::to_string(value)?))
    });

    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint_with_settings("/api/wrapped", settings)
        .on_get(|| (json!([1, 2]), StatusCode::OK, None));

    let response = respond(&server, InboundRequest::new(Method::GET, "/api/wrapped"));
    assert_eq!(body_text(response).await, "<<[1,2]>>");
}

#[tokio::test]
async fn test_cloned_builder_binds_several_verbs() {
    let server = MockServer::start(0).await.unwrap();
    let builder = server
        .endpoint("/api/item")
        .with_default_body_type(BodyType::PlainText)
        .require_bearer("t", "Unauthorized", BodyType::PlainText);

    builder
        .clone()
        .on_get(|| ("item", StatusCode::OK, None))
        .endpoint("/api/other")
        .on_get(|| ("other", StatusCode::OK, None));
    builder.on_patch(|text: String| (format!("Patched: {text}"), StatusCode::OK, None));

    assert_eq!(server.route_count(), 3);
    let route = server.route(Method::PATCH, "/api/item").unwrap();
    assert!(route.config().has_auth());
    assert!(route.reads_body());
    assert!(!server.route(Method::GET, "/api/item").unwrap().reads_body());

    let request = InboundRequest::new(Method::PATCH, "/api/item")
        .with_header("Authorization", "Bearer t")
        .with_body("patch-data");
    let response = respond(&server, request);
    assert_eq!(body_text(response).await, "Patched: patch-data");
}

#[tokio::test]
async fn test_last_registration_wins() {
    let server = MockServer::start(0).await.unwrap();
    server
        .endpoint("/api/dup")
        .with_response_body_type(BodyType::PlainText)
        .on_get(|| ("first", StatusCode::OK, None));
    server
        .endpoint("/api/dup")
        .with_response_body_type(BodyType::PlainText)
        .on_get(|| ("second", StatusCode::ACCEPTED, None));

    assert_eq!(server.route_count(), 1);
    let response = respond(&server, InboundRequest::new(Method::GET, "/api/dup"));
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_text(response).await, "second");
}
