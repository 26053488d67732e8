use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub task: Option<String>,
}

/// `GET /stats?task=`: all tracked tasks, or a single task's stats.
pub async fn task_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(model) = &state.model else {
        return Ok(Json(json!({})));
    };

    match query.task {
        Some(task) => match model.task_stats(&task) {
            Some(stats) => Ok(Json(serde_json::to_value(stats).unwrap_or(json!({})))),
            None => Err(ApiError::NotFound),
        },
        None => Ok(Json(serde_json::to_value(model.stats()).unwrap_or(json!({})))),
    }
}

/// `GET /v2/model/stats`: the model's aggregate stats (with coefficients
/// where applicable). 503 if no model is configured.
pub async fn model_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let model = state.model.as_ref().ok_or(ApiError::EngineDisabled)?;
    Ok(Json(model.stats()))
}
