//! HTTP surface for the cache gateway.
//!
//! One endpoint: `POST /replicate` with the quantized wire payload.
//! Responses follow the protocol the client transport expects:
//! `200 {"url"}` on success, `400 {"error"}` for an invalid payload,
//! `405` with `Allow: POST` for any other method, `500 {"error"}` when
//! the model invocation fails.
//!
//! Payloads arriving here are trusted to be quantized already — the
//! client coordinator guarantees it, and a raw-valued payload only costs
//! cache efficiency, never correctness.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use super::gateway::CacheGateway;
use crate::request::RenderPayload;

/// Build the gateway router.
pub fn router(gateway: Arc<CacheGateway>) -> Router {
    Router::new()
        .route(
            "/replicate",
            post(replicate).fallback(method_not_allowed),
        )
        .with_state(gateway)
}

async fn replicate(
    State(gateway): State<Arc<CacheGateway>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let started = Instant::now();

    let payload: RenderPayload = match serde_json::from_value(body) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("invalid payload: {e}") })),
            )
                .into_response();
        }
    };
    if payload.image.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "image is required" })),
        )
            .into_response();
    }

    match gateway.resolve(&payload).await {
        Ok(resolution) => {
            info!(
                key = %resolution.key,
                cache_hit = resolution.cache_hit,
                duration_ms = started.elapsed().as_millis() as u64,
                "replicate request served"
            );
            (StatusCode::OK, Json(json!({ "url": resolution.url }))).into_response()
        }
        Err(e) => {
            error!(
                error = %e,
                duration_ms = started.elapsed().as_millis() as u64,
                "replicate request failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("error processing request: {e}") })),
            )
                .into_response()
        }
    }
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
    )
        .into_response()
}
