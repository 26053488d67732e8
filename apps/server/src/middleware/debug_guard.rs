use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

/// Gate in front of `/debug/*`: requires a `Bearer` token matching
/// `auth.debug_bearer_token`. Absent that configuration, `/debug/*` is
/// unconditionally forbidden — there is no "open debug" mode.
pub async fn debug_bearer_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let config = state.config.read().await;
    let Some(expected) = config.auth.debug_bearer_token.clone() else {
        return StatusCode::FORBIDDEN.into_response();
    };
    drop(config);

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match provided {
        Some(token) if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) => next.run(req).await,
        _ => StatusCode::FORBIDDEN.into_response(),
    }
}
