// Access gateway - rate limiting and admin authentication middleware.
//
// Route groups stack these as `.layer(require_admin).layer(rate limit)` so
// the rate limit runs first and throttled requests never reach token checks.

use super::api_error::ApiError;
use super::AppState;
use crate::core::rate_limit::{Admission, RateBucket};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{AUTHORIZATION, RETRY_AFTER};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Duration;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Middleware state for one rate-limited route group.
#[derive(Clone)]
pub struct BucketGuard {
    pub state: AppState,
    pub bucket: RateBucket,
}

impl BucketGuard {
    pub fn new(state: &AppState, bucket: RateBucket) -> Self {
        Self {
            state: state.clone(),
            bucket,
        }
    }
}

/// Client key for rate limiting: the peer IP, or "unknown" when the server
/// runs without connect info.
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Accepts either the raw token or `Bearer <token>`.
fn presented_token(request: &Request) -> &str {
    let value = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim();
    value.strip_prefix("Bearer ").unwrap_or(value).trim()
}

/// Seconds, rounded up so clients never retry early.
fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// `RateLimit-*` headers on every response, plus `Retry-After` when throttled.
fn insert_rate_limit_headers(headers: &mut HeaderMap, limit: u32, admission: &Admission) {
    let reset = whole_seconds(admission.reset_after());
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(admission.remaining()));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(reset));
    if let Admission::Throttled { .. } = admission {
        headers.insert(RETRY_AFTER, HeaderValue::from(reset));
    }
}

pub async fn enforce_rate_limit(
    State(guard): State<BucketGuard>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    let policy = guard.bucket.policy();
    let admission = guard.state.limiter.admit(&client, guard.bucket).await;

    let mut response = if admission.is_allowed() {
        let response = next.run(request).await;
        if policy.skip_successful && response.status().is_success() {
            guard.state.limiter.refund(&client, guard.bucket).await;
        }
        response
    } else {
        ApiError::Throttled(policy.message).into_response()
    };

    insert_rate_limit_headers(response.headers_mut(), policy.max_hits, &admission);
    response
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = state.auth.verify(presented_token(&request))?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
