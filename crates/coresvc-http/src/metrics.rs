//! Process-wide metrics registry and its hand-rolled Prometheus text
//! exposition, served by the internal `/metrics` handler.
//!
//! No `metrics`/`prometheus` crate dependency: the exposition format this
//! service needs (a handful of counters, one histogram, a few gauges) is
//! small enough to hand-roll, the same way the error bodies in this crate
//! are hand-rolled JSON rather than reaching for a problem-details crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const LATENCY_BUCKETS_SECS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Debug, Default, Clone, Copy)]
struct RouteTotals {
    count: u64,
    response_bytes: u64,
    latency_sum_secs: f64,
    latency_buckets: [u64; LATENCY_BUCKETS_SECS.len()],
}

/// Snapshot of database pool state, reported by a closure the bootstrap
/// wires in — keeps this crate free of the `sqlx` dependency.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolMetricsSnapshot {
    pub total: u32,
    pub idle: u32,
    pub in_use: u32,
    pub max_open: u32,
    pub wait_count: u64,
    pub wait_duration_secs: f64,
}

pub struct Metrics {
    requests: Mutex<HashMap<(String, String, u16), RouteTotals>>,
    circuit_breaker_active: AtomicI64,
    bulkhead_in_flight: AtomicI64,
    idempotency_stored_total: AtomicU64,
    idempotency_replayed_total: AtomicU64,
    rate_limited_total: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            circuit_breaker_active: AtomicI64::new(0),
            bulkhead_in_flight: AtomicI64::new(0),
            idempotency_stored_total: AtomicU64::new(0),
            idempotency_replayed_total: AtomicU64::new(0),
            rate_limited_total: AtomicU64::new(0),
        }
    }

    /// Record one completed request, keyed by method, routed path
    /// template, and status code (not the raw path — avoids cardinality
    /// explosion from path parameters).
    pub fn observe_request(
        &self,
        method: &str,
        route: &str,
        status: u16,
        duration: Duration,
        response_bytes: u64,
    ) {
        let mut requests = self.requests.lock().expect("metrics mutex poisoned");
        let entry = requests
            .entry((method.to_string(), route.to_string(), status))
            .or_default();
        entry.count += 1;
        entry.response_bytes += response_bytes;
        let secs = duration.as_secs_f64();
        entry.latency_sum_secs += secs;
        for (i, bucket) in LATENCY_BUCKETS_SECS.iter().enumerate() {
            if secs <= *bucket {
                entry.latency_buckets[i] += 1;
            }
        }
    }

    pub fn set_circuit_breaker_active(&self, active: bool) {
        self.circuit_breaker_active
            .store(i64::from(active), Ordering::Relaxed);
    }

    pub fn set_bulkhead_in_flight(&self, in_flight: i64) {
        self.bulkhead_in_flight.store(in_flight, Ordering::Relaxed);
    }

    pub fn record_idempotency_stored(&self) {
        self.idempotency_stored_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_idempotency_replayed(&self) {
        self.idempotency_replayed_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Render the full text exposition: request counters, a latency
    /// histogram, resilience gauges, and whatever `pool` snapshot the
    /// bootstrap supplies (absent before the pool is constructed).
    #[must_use]
    pub fn render(&self, pool: Option<PoolMetricsSnapshot>, shutdown_in_progress: bool, active_requests: i64) -> String {
        let mut out = String::new();

        out.push_str("# HELP http_requests_total Total HTTP requests handled.\n");
        out.push_str("# TYPE http_requests_total counter\n");
        {
            let requests = self.requests.lock().expect("metrics mutex poisoned");
            for ((method, route, status), totals) in requests.iter() {
                out.push_str(&format!(
                    "http_requests_total{{method=\"{method}\",route=\"{route}\",status=\"{status}\"}} {}\n",
                    totals.count
                ));
            }

            out.push_str("# HELP http_response_size_bytes_total Cumulative response body bytes.\n");
            out.push_str("# TYPE http_response_size_bytes_total counter\n");
            for ((method, route, status), totals) in requests.iter() {
                out.push_str(&format!(
                    "http_response_size_bytes_total{{method=\"{method}\",route=\"{route}\",status=\"{status}\"}} {}\n",
                    totals.response_bytes
                ));
            }

            out.push_str("# HELP http_request_duration_seconds Request latency histogram.\n");
            out.push_str("# TYPE http_request_duration_seconds histogram\n");
            for ((method, route, status), totals) in requests.iter() {
                let mut cumulative = 0u64;
                for (i, bucket) in LATENCY_BUCKETS_SECS.iter().enumerate() {
                    cumulative += totals.latency_buckets[i];
                    out.push_str(&format!(
                        "http_request_duration_seconds_bucket{{method=\"{method}\",route=\"{route}\",status=\"{status}\",le=\"{bucket}\"}} {cumulative}\n"
                    ));
                }
                out.push_str(&format!(
                    "http_request_duration_seconds_bucket{{method=\"{method}\",route=\"{route}\",status=\"{status}\",le=\"+Inf\"}} {}\n",
                    totals.count
                ));
                out.push_str(&format!(
                    "http_request_duration_seconds_sum{{method=\"{method}\",route=\"{route}\",status=\"{status}\"}} {}\n",
                    totals.latency_sum_secs
                ));
                out.push_str(&format!(
                    "http_request_duration_seconds_count{{method=\"{method}\",route=\"{route}\",status=\"{status}\"}} {}\n",
                    totals.count
                ));
            }
        }

        out.push_str("# HELP circuit_breaker_active 1 if any circuit breaker is open, 0 otherwise.\n");
        out.push_str("# TYPE circuit_breaker_active gauge\n");
        out.push_str(&format!(
            "circuit_breaker_active {}\n",
            self.circuit_breaker_active.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP bulkhead_in_flight Current in-flight count held by the bulkhead.\n");
        out.push_str("# TYPE bulkhead_in_flight gauge\n");
        out.push_str(&format!(
            "bulkhead_in_flight {}\n",
            self.bulkhead_in_flight.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP idempotency_requests_total Idempotent POSTs by outcome.\n");
        out.push_str("# TYPE idempotency_requests_total counter\n");
        out.push_str(&format!(
            "idempotency_requests_total{{outcome=\"stored\"}} {}\n",
            self.idempotency_stored_total.load(Ordering::Relaxed)
        ));
        out.push_str(&format!(
            "idempotency_requests_total{{outcome=\"replayed\"}} {}\n",
            self.idempotency_replayed_total.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP rate_limited_requests_total Requests denied by the rate limiter.\n");
        out.push_str("# TYPE rate_limited_requests_total counter\n");
        out.push_str(&format!(
            "rate_limited_requests_total {}\n",
            self.rate_limited_total.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP shutdown_in_progress 1 once the shutdown flag is set, 0 otherwise.\n");
        out.push_str("# TYPE shutdown_in_progress gauge\n");
        out.push_str(&format!("shutdown_in_progress {}\n", i64::from(shutdown_in_progress)));

        out.push_str("# HELP active_requests In-flight request count tracked by the shutdown guard.\n");
        out.push_str("# TYPE active_requests gauge\n");
        out.push_str(&format!("active_requests {active_requests}\n"));

        out.push_str("# HELP process_threads Runtime worker thread gauge (Rust-native liveness signal).\n");
        out.push_str("# TYPE process_threads gauge\n");
        out.push_str(&format!(
            "process_threads {}\n",
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        ));

        if let Some(pool) = pool {
            out.push_str("# HELP db_pool_connections Database pool connection counts.\n");
            out.push_str("# TYPE db_pool_connections gauge\n");
            out.push_str(&format!("db_pool_connections{{state=\"total\"}} {}\n", pool.total));
            out.push_str(&format!("db_pool_connections{{state=\"idle\"}} {}\n", pool.idle));
            out.push_str(&format!("db_pool_connections{{state=\"in_use\"}} {}\n", pool.in_use));
            out.push_str(&format!("db_pool_connections{{state=\"max_open\"}} {}\n", pool.max_open));

            out.push_str("# HELP db_pool_wait_count_total Cumulative connection-acquire waits.\n");
            out.push_str("# TYPE db_pool_wait_count_total counter\n");
            out.push_str(&format!("db_pool_wait_count_total {}\n", pool.wait_count));

            out.push_str("# HELP db_pool_wait_duration_seconds_total Cumulative connection-acquire wait time.\n");
            out.push_str("# TYPE db_pool_wait_duration_seconds_total counter\n");
            out.push_str(&format!(
                "db_pool_wait_duration_seconds_total {}\n",
                pool.wait_duration_secs
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_help_and_type_lines() {
        let metrics = Metrics::new();
        metrics.observe_request("GET", "/api/v1/users/{id}", 200, Duration::from_millis(5), 128);
        let rendered = metrics.render(None, false, 0);
        assert!(rendered.contains("# HELP http_requests_total"));
        assert!(rendered.contains("# TYPE http_requests_total counter"));
        assert!(rendered.contains("http_requests_total{method=\"GET\",route=\"/api/v1/users/{id}\",status=\"200\"} 1"));
        assert!(rendered.contains("process_threads"));
    }

    #[test]
    fn render_includes_pool_gauges_when_present() {
        let metrics = Metrics::new();
        let rendered = metrics.render(
            Some(PoolMetricsSnapshot {
                total: 5,
                idle: 3,
                in_use: 2,
                max_open: 25,
                wait_count: 1,
                wait_duration_secs: 0.01,
            }),
            true,
            1,
        );
        assert!(rendered.contains("db_pool_connections{state=\"total\"} 5"));
        assert!(rendered.contains("shutdown_in_progress 1"));
        assert!(rendered.contains("active_requests 1"));
    }
}
