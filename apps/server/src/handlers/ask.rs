use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use capfox_core_decision::{DecisionStrategy, ThresholdStrategy};
use capfox_domain_models::{ClientHints, DecisionContext, DecisionResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub task: String,
    #[serde(default)]
    pub complexity: Option<u64>,
    #[serde(default)]
    pub resources: Option<ClientHints>,
}

#[derive(Debug, Deserialize)]
pub struct AskQuery {
    #[serde(default)]
    pub reason: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Vec<String>>,
}

fn wants_reasons(query: &AskQuery, headers: &HeaderMap) -> bool {
    query.reason.unwrap_or(false)
        || headers
            .get("X-Reason")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

fn respond(result: DecisionResult, include_reasons: bool) -> impl IntoResponse {
    let status = if result.allowed {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };
    let body = AskResponse {
        allowed: result.allowed,
        reasons: if !result.allowed && include_reasons { Some(result.reasons) } else { None },
    };
    (status, Json(body))
}

/// `POST /ask` (v1): a direct threshold check against the live
/// `SystemState`, bypassing the prediction model and pending queue
/// entirely. This is the "legacy" admission check the CLI's `--legacy`
/// flag talks to.
pub async fn ask_v1(
    State(state): State<AppState>,
    Query(query): Query<AskQuery>,
    headers: HeaderMap,
    Json(body): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.task.is_empty() {
        return Err(ApiError::BadRequest("task must not be empty".to_string()));
    }

    let current_state = if state.aggregator.ready() {
        Some(state.aggregator.get_state().await)
    } else {
        None
    };
    let thresholds = state.config.read().await.thresholds.clone().into();

    let ctx = DecisionContext {
        task_name: body.task,
        complexity: body.complexity.unwrap_or(1),
        client_hints: body.resources,
        current_state,
        prediction: None,
        thresholds: Some(thresholds),
        safety_buffer: 0.0,
        pending_tasks: Vec::new(),
    };
    let result = ThresholdStrategy.decide(&ctx, None);
    Ok(respond(result, wants_reasons(&query, &headers)))
}

/// `POST /v2/ask`: routes through the configured decision engine and
/// prediction model. 503 with `engine disabled` if neither is wired up.
pub async fn ask_v2(
    State(state): State<AppState>,
    Query(query): Query<AskQuery>,
    headers: HeaderMap,
    Json(body): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.task.is_empty() {
        return Err(ApiError::BadRequest("task must not be empty".to_string()));
    }
    let Some(decision) = &state.decision else {
        return Err(ApiError::EngineDisabled);
    };

    let result = decision
        .decide(&body.task, body.complexity.unwrap_or(1), body.resources)
        .await;
    Ok(respond(result, wants_reasons(&query, &headers)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_flag_honours_query_and_header() {
        let mut headers = HeaderMap::new();
        assert!(!wants_reasons(&AskQuery { reason: None }, &headers));
        assert!(wants_reasons(&AskQuery { reason: Some(true) }, &headers));

        headers.insert("X-Reason", "true".parse().unwrap());
        assert!(wants_reasons(&AskQuery { reason: None }, &headers));
    }
}
