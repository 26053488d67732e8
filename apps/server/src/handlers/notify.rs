use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use capfox_domain_models::PendingTask;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub task: String,
    #[serde(default)]
    pub complexity: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub received: bool,
    pub task: String,
}

/// `POST /task/notify`: feeds both C4 (the learning engine, for model
/// training) and, if the v2 engine is enabled, C8 (the pending queue the
/// queue-aware strategy reads) with the same task id. The pending-queue
/// entry is pulled back out after `observation_delay`, mirroring C4's own
/// removal, since the two registries live in separate crates and are not
/// jointly owned.
pub async fn notify_task(
    State(state): State<AppState>,
    Json(body): Json<NotifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.task.is_empty() {
        return Err(ApiError::BadRequest("task must not be empty".to_string()));
    }
    let complexity = body.complexity.unwrap_or(1);

    let Some(learning) = &state.learning else {
        return Ok(Json(NotifyResponse { received: true, task: body.task }));
    };

    let Some(task_id) = learning.notify_task_start(&body.task, complexity).await else {
        return Ok(Json(NotifyResponse { received: false, task: body.task }));
    };

    if let Some(decision) = state.decision.clone() {
        let observation_delay = state.config.read().await.learning.observation_delay_ms;
        let pending = PendingTask {
            id: task_id.clone(),
            task_name: body.task.clone(),
            complexity,
            started_at: chrono::Utc::now(),
            baseline_state: state.aggregator.get_state().await,
            predicted_impact: state.model.as_ref().and_then(|m| m.predict(&body.task, complexity)),
        };
        decision.add_pending_task(pending).await;

        let task_name = body.task.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(observation_delay)).await;
            decision.remove_pending_task(&task_name).await;
        });
    }

    Ok(Json(NotifyResponse { received: true, task: body.task }))
}
