use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// `GET /v2/scheduler/stats`: C5 stats. 503 if retraining is disabled
/// (no batch model configured).
pub async fn scheduler_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let scheduler = state.scheduler.as_ref().ok_or(ApiError::EngineDisabled)?;
    let stats = scheduler.stats();
    Ok(Json(json!({
        "running": stats.running,
        "interval_secs": stats.interval.as_secs(),
        "retrain_count": stats.retrain_count,
        "last_retrain": stats.last_retrain,
        "last_error": stats.last_error,
    })))
}

/// `POST /v2/scheduler/retrain`: bypasses the schedule and need-check.
pub async fn scheduler_retrain(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let scheduler = state.scheduler.as_ref().ok_or(ApiError::EngineDisabled)?;
    scheduler.force_retrain();
    Ok(Json(json!({ "success": true })))
}
