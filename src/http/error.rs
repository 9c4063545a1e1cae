//! API error taxonomy and its HTTP mapping.
//!
//! | Variant           | Status |
//! |-------------------|--------|
//! | `Validation`      | 400    |
//! | `Unauthenticated` | 401    |
//! | `NotFound`        | 404    |
//! | `RouteNotFound`   | 404    |
//! | `Conflict`        | 409    |
//! | `RateLimited`     | 429    |
//! | `Internal`        | 500    |

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::security::token::TokenError;
use crate::users::ValidationError;

/// Generic message sent for any unexpected fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("User with Id {0} not found.")]
    NotFound(i32),

    /// No route matched the request.
    #[error("Not found.")]
    RouteNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthenticated(#[from] TokenError),

    #[error("Too many requests.")]
    RateLimited { retry_after: Duration },

    /// Carries the trace id reported to the client.
    #[error("Internal server error.")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of a 500 response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultBody {
    pub error: &'static str,
    pub trace_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Internal(trace_id) => (
                status,
                Json(FaultBody {
                    error: INTERNAL_ERROR_MESSAGE,
                    trace_id,
                }),
            )
                .into_response(),
            ApiError::Unauthenticated(_) => {
                // Token failure details stay in the logs.
                let mut response = (status, Json("Unauthorized")).into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer"),
                );
                response
            }
            ApiError::RateLimited { retry_after } => {
                let mut response = (status, Json(self.to_string())).into_response();
                let secs = (retry_after.as_millis() as u64).div_ceil(1000).max(1);
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            other => (status, Json(other.to_string())).into_response(),
        }
    }
}
