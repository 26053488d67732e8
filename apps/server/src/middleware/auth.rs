use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

/// `true` if `path` matches an exclude entry: an exact match, or (for an
/// entry ending in `*`) a prefix match on everything before the `*`.
fn path_excluded(path: &str, exclude: &[String]) -> bool {
    exclude.iter().any(|entry| match entry.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => path == entry,
    })
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Optional global Basic-Auth gate. A no-op when `auth.basic` is unset.
pub async fn basic_auth_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let config = state.config.read().await;
    let Some(basic) = &config.auth.basic else {
        drop(config);
        return next.run(req).await;
    };

    if path_excluded(req.uri().path(), &basic.exclude) {
        drop(config);
        return next.run(req).await;
    }

    let expected_username = basic.username.clone();
    let expected_password = basic.password.clone();
    drop(config);

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok());

    let authorised = match provided.as_deref().and_then(|s| s.split_once(':')) {
        Some((user, pass)) => {
            constant_time_eq(user, &expected_username) && constant_time_eq(pass, &expected_password)
        }
        None => false,
    };

    if authorised {
        next.run(req).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"capfox\"")],
        )
            .into_response()
    }
}
