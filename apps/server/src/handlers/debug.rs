use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// `GET /debug/vars`: process uptime and pending-work counters, gated by
/// the bearer-token middleware in front of the whole `/debug` tree.
pub async fn debug_vars(State(state): State<AppState>) -> impl IntoResponse {
    let pending = match &state.learning {
        Some(learning) => learning.pending_count().await,
        None => 0,
    };
    Json(json!({
        "uptime_secs": (chrono::Utc::now() - state.started_at).num_seconds().max(0),
        "pending_tasks": pending,
        "active_workers": state.learning.as_ref().map(|l| l.active_workers()).unwrap_or(0),
    }))
}
