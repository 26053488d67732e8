use crate::state::{AppState, SERVICE_NAME, SERVICE_VERSION};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn index() -> impl IntoResponse {
    Json(json!({ "name": SERVICE_NAME, "version": SERVICE_VERSION }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.aggregator.ready() {
        (StatusCode::OK, Json(json!({ "ready": true }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ready": false, "message": "aggregator has not completed its first collection" })),
        )
            .into_response()
    }
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.aggregator.get_state().await)
}
