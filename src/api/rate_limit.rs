//! Per-client request rate limiting.
//!
//! Each client IP gets its own GCRA limiter: `max_requests` may arrive in a
//! burst, then capacity refills evenly over the window.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use tracing::warn;

use super::handlers::AppState;
use crate::error::ApiError;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

// == Client Rate Limiter ==
#[derive(Clone)]
pub struct ClientRateLimiter {
    quota: Quota,
    max_requests: u32,
    // TODO: drop limiters for clients idle longer than one window
    limiters: Arc<DashMap<IpAddr, Arc<DirectRateLimiter>>>,
}

impl ClientRateLimiter {
    /// Limiter allowing `max_requests` per `window` for each client.
    /// Returns `None` when `max_requests` is zero, meaning no limit.
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(max_requests)?;
        let quota = Quota::with_period(window / max_requests)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Some(Self {
            quota,
            max_requests,
            limiters: Arc::new(DashMap::new()),
        })
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Admits one request from `client`, or returns the seconds to wait.
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        let limiter = self
            .limiters
            .entry(client)
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone();

        limiter.check().map_err(|not_until| {
            not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1)
        })
    }
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer. Requests with none of these share one bucket.
fn client_ip(request: &Request) -> IpAddr {
    let headers = request.headers();

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok());
    if let Some(ip) = forwarded {
        return ip;
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok());
    if let Some(ip) = real_ip {
        return ip;
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rejects requests over the per-client limit with 429.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(limiter) = &state.rate_limiter else {
        return Ok(next.run(request).await);
    };

    let client = client_ip(&request);
    if let Err(retry_after) = limiter.check(client) {
        warn!(client = %client, retry_after, "Rate limit exceeded");
        return Err(ApiError::RateLimited { retry_after });
    }

    Ok(next.run(request).await)
}
