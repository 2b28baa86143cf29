//! Per-request dispatch from hyper into bound routes.

use super::core::ServerState;
use crate::endpoint::RouteKey;
use crate::request::InboundRequest;
use crate::response::{json_response, plain_response};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error};

pub(crate) async fn handle_request<B>(
    req: Request<B>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Display,
{
    state.increment_request_count();

    let (parts, body) = req.into_parts();
    let key = RouteKey::new(parts.method.clone(), parts.uri.path());

    let Some(route) = state.route(&key) else {
        debug!("No route for {}", key);
        return Ok(json_response(
            StatusCode::NOT_FOUND,
            &json!({ "status": "No matching mapping found" }),
        ));
    };

    let body = if route.reads_body() {
        match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                error!("Failed to read request body for {}: {}", key, e);
                return Ok(plain_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to read request body: {e}"),
                ));
            }
        }
    } else {
        Bytes::new()
    };

    let request = InboundRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    };

    Ok(route.respond(&request))
}
