//! Router assembly: handlers plus the middleware stack.

use std::any::Any;

use axum::{
    Json, Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{self, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    handlers,
    middleware::{client::client_address, origin::cross_origin_protection},
    state::AppState,
};

pub fn build(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    // Request ID header name
    let x_request_id = HeaderName::from_static("x-request-id");

    handlers::router()
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(axum::middleware::from_fn(cross_origin_protection))
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::custom(handle_panic))
        // Request ID: generate UUID, include in logs, return in response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &http::Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                    client = %client_address(request.headers(), request.extensions()),
                )
            },
        ))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    tracing::error!(panic = %detail, "panic recovered");

    let body = serde_json::json!({ "error": "Internal server error" });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
