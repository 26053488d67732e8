use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Global plus per-IP token buckets. Both refill at their
/// configured per-second rate; either bucket running dry is a 429.
pub struct RateLimiters {
    global: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    per_ip: RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>,
}

impl RateLimiters {
    pub fn new(global_per_second: u32, per_ip_per_second: u32) -> Self {
        let global_quota = Quota::per_second(nonzero(global_per_second));
        let per_ip_quota = Quota::per_second(nonzero(per_ip_per_second));
        Self {
            global: RateLimiter::direct(global_quota),
            per_ip: RateLimiter::keyed(per_ip_quota),
        }
    }

    fn check(&self, ip: IpAddr) -> bool {
        self.global.check().is_ok() && self.per_ip.check_key(&ip).is_ok()
    }
}

fn nonzero(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::new(1).unwrap())
}

/// Swappable handle around [`RateLimiters`] so a SIGHUP config reload can
/// replace the buckets' quotas without restarting the listener. Reads take
/// only a shared lock; a reload takes the writer once, briefly.
pub struct RateLimiterRegistry {
    inner: tokio::sync::RwLock<Arc<RateLimiters>>,
}

impl RateLimiterRegistry {
    pub fn new(global_per_second: u32, per_ip_per_second: u32) -> Self {
        Self {
            inner: tokio::sync::RwLock::new(Arc::new(RateLimiters::new(global_per_second, per_ip_per_second))),
        }
    }

    pub async fn reload(&self, global_per_second: u32, per_ip_per_second: u32) {
        *self.inner.write().await = Arc::new(RateLimiters::new(global_per_second, per_ip_per_second));
    }

    async fn check(&self, ip: IpAddr) -> bool {
        self.inner.read().await.check(ip)
    }
}

pub async fn rate_limit_guard(
    State(registry): State<Arc<RateLimiterRegistry>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    if registry.check(addr.ip()).await {
        next.run(req).await
    } else {
        (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response()
    }
}
