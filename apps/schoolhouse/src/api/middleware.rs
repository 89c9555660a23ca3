//! # Middleware Module
//!
//! Global rate limiting for the Schoolhouse HTTP API.
//!
//! The limit comes from `Config::rate_limit` (file key `rate_limit`, or
//! `SCHOOLHOUSE_RATE_LIMIT`). A value of 0 disables the limiter.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::types::ActionResponse;

/// Fallback when a zero rate reaches the constructor.
const DEFAULT_RPS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(rps) => rps,
    None => NonZeroU32::MIN,
};

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a global rate limiter allowing `requests_per_second`.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Rejects requests with 429 once the global limiter is exhausted.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ActionResponse::failure("Too many requests. Try again shortly.")),
            )
                .into_response()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
