//! Handlers for the non-resource routes.

use std::collections::BTreeMap;

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::pipeline::TraceId;
use crate::observability::RequestCounter;

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Minimal Users API" }))
}

/// `GET /metrics`: per-route request counts.
pub async fn metrics(State(counter): State<RequestCounter>) -> Json<BTreeMap<String, u64>> {
    Json(counter.snapshot())
}

/// `GET /error`: the generic fault response.
pub async fn error(Extension(TraceId(trace_id)): Extension<TraceId>) -> ApiError {
    ApiError::Internal(trace_id)
}

/// `GET /boom`: fails unconditionally to exercise fault translation.
pub async fn boom() -> Json<Value> {
    panic!("Test exception from /boom");
}

/// Any path without a route.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
