//! Layer 9 of the `/api/v1` pipeline: a token-bucket rate limiter keyed by
//! client IP (resolved by the `RealIP` layer that runs before this one).

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::fixed_problem;
use crate::middleware::real_ip::ClientIp;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// One bucket per client IP. `rps` refills tokens continuously; `burst`
/// bounds the bucket's capacity.
pub struct RateLimiter {
    rps: f64,
    burst: f64,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(rps: f64, burst: u32) -> Self {
        Self {
            rps,
            burst: f64::from(burst).max(1.0),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Attempts to take one token for `ip`. Returns `Ok(remaining)` on
    /// success, `Err(retry_after)` when the bucket is empty.
    fn try_acquire(&self, ip: IpAddr) -> Result<f64, Duration> {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();
        let bucket = buckets.entry(ip).or_insert_with(|| Bucket {
            tokens: self.burst,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rps).min(self.burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(bucket.tokens)
        } else {
            let deficit = 1.0 - bucket.tokens;
            Err(Duration::from_secs_f64(deficit / self.rps))
        }
    }
}

/// Denies with 429 and `X-RateLimit-{Limit,Remaining}` / `Retry-After`
/// headers once a client IP exhausts its bucket.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let ip = request
        .extensions()
        .get::<ClientIp>()
        .map_or_else(|| IpAddr::from([0, 0, 0, 0]), |c| c.0);

    match state.rate_limiter.try_acquire(ip) {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            insert_header(&mut response, "x-ratelimit-limit", &format!("{}", state.rate_limiter.burst as u64));
            insert_header(&mut response, "x-ratelimit-remaining", &format!("{}", remaining as u64));
            response
        }
        Err(retry_after) => {
            state.metrics.record_rate_limited();
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .map_or_else(String::new, |id| id.0.clone());
            let mut response = fixed_problem(
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                "rate limit exceeded",
                &request_id,
                &state.config.problem_base_url,
            );
            insert_header(&mut response, "retry-after", &format!("{}", retry_after.as_secs().max(1)));
            insert_header(&mut response, "x-ratelimit-limit", &format!("{}", state.rate_limiter.burst as u64));
            insert_header(&mut response, "x-ratelimit-remaining", "0");
            response
        }
    }
}

fn insert_header(response: &mut Response, name: &'static str, value: &str) {
    if let Ok(value) = value.parse() {
        response.headers_mut().insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_burst_then_denies() {
        let limiter = RateLimiter::new(1.0, 2);
        let ip = IpAddr::from([127, 0, 0, 1]);
        assert!(limiter.try_acquire(ip).is_ok());
        assert!(limiter.try_acquire(ip).is_ok());
        assert!(limiter.try_acquire(ip).is_err());
    }

    #[test]
    fn separate_ips_have_separate_buckets() {
        let limiter = RateLimiter::new(1.0, 1);
        let a = IpAddr::from([10, 0, 0, 1]);
        let b = IpAddr::from([10, 0, 0, 2]);
        assert!(limiter.try_acquire(a).is_ok());
        assert!(limiter.try_acquire(b).is_ok());
    }
}
