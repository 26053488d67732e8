//! Maps the error taxonomy onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error("unauthorised")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("decision engine disabled")]
    EngineDisabled,
    #[error("internal fault: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, json!({ "error": reason })),
            ApiError::Unauthorized => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "unauthorised" })),
                )
                    .into_response();
                response.headers_mut().insert(
                    axum::http::header::WWW_AUTHENTICATE,
                    axum::http::HeaderValue::from_static("Basic realm=\"capfox\""),
                );
                return response;
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "forbidden" })),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not found" })),
            ApiError::EngineDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "decision engine disabled" }),
            ),
            ApiError::Internal(reason) => {
                tracing::error!(error = %reason, "internal fault");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal fault" }))
            }
        };
        (status, Json(body)).into_response()
    }
}
