//! HTTP middleware: auth, the `/debug/*` bearer gate, security headers and
//! rate limiting.

mod auth;
mod debug_guard;
mod rate_limit;
mod security_headers;

pub use auth::basic_auth_guard;
pub use debug_guard::debug_bearer_guard;
pub use rate_limit::{rate_limit_guard, RateLimiterRegistry, RateLimiters};
pub use security_headers::security_headers;
