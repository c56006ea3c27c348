// Rate limiting middleware using tower-governor
//
// Configuration:
// - Per client IP via `SmartIpKeyExtractor` (X-Forwarded-For / X-Real-IP /
//   Forwarded / socket), RATE_LIMIT_PER_SECOND replenished per second with
//   bursts up to RATE_LIMIT_BURST
// - Applied in app.rs to every route except /health
//
// tower-governor answers with a plain-text 429; `rate_limit_envelope` rewrites
// it into the JSON error envelope.

use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::common::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitSettings {
    /// Milliseconds between two replenished requests
    pub fn replenish_interval_ms(&self) -> u64 {
        (1000 / self.per_second.max(1)).max(1)
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            per_second: 10,
            burst_size: 20,
        }
    }
}

/// Wrap governor rejections in `{ "success": false, "error": ... }`
pub async fn rate_limit_envelope(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if response.status() != StatusCode::TOO_MANY_REQUESTS || is_json {
        return response;
    }

    let mut rewritten =
        ApiError::RateLimited("Too many requests, please slow down".into()).into_response();
    for name in ["retry-after", "x-ratelimit-after", "x-ratelimit-limit", "x-ratelimit-remaining"] {
        if let Some(value) = response.headers().get(name) {
            rewritten.headers_mut().insert(name, value.clone());
        }
    }
    rewritten
}
