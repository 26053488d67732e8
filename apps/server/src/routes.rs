use crate::handlers::{
    ask_v1, ask_v2, debug_vars, health, index, model_stats, notify_task, ready, scheduler_retrain,
    scheduler_stats, status, task_stats,
};
use crate::middleware::{basic_auth_guard, debug_bearer_guard, rate_limit_guard, security_headers, RateLimiterRegistry};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState, rate_limiters: Arc<RateLimiterRegistry>) -> Router {
    let debug_tree = Router::new()
        .route("/vars", get(debug_vars))
        .layer(middleware::from_fn_with_state(state.clone(), debug_bearer_guard));

    let v2_tree = Router::new()
        .route("/ask", post(ask_v2))
        .route("/model/stats", get(model_stats))
        .route("/scheduler/stats", get(scheduler_stats))
        .route("/scheduler/retrain", post(scheduler_retrain));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/status", get(status))
        .route("/ask", post(ask_v1))
        .route("/task/notify", post(notify_task))
        .route("/stats", get(task_stats))
        .nest("/v2", v2_tree)
        .nest("/debug", debug_tree)
        // `.layer()` nests outside-in in call order: the last call here is
        // the outermost layer, so security headers land on every response
        // (including 401/429 short-circuits) and rate limiting runs before
        // auth and body parsing.
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), basic_auth_guard))
        .layer(middleware::from_fn_with_state(rate_limiters, rate_limit_guard))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}
