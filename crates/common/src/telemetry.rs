//! In-process operational counters.
//!
//! Tracks HTTP traffic and the report pipeline (snapshot recomputations,
//! degraded stat groups, exports and their fallbacks) so operators can see
//! whether the admin dashboard is being served from degraded data.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global telemetry instance.
static TELEMETRY: std::sync::OnceLock<Arc<Telemetry>> = std::sync::OnceLock::new();

/// Get the global telemetry instance.
pub fn get_telemetry() -> &'static Arc<Telemetry> {
    TELEMETRY.get_or_init(|| Arc::new(Telemetry::new()))
}

/// Operational counters.
#[derive(Debug)]
pub struct Telemetry {
    // === Request Metrics ===
    /// Total HTTP requests received
    pub http_requests_total: AtomicU64,
    pub http_requests_2xx: AtomicU64,
    pub http_requests_4xx: AtomicU64,
    pub http_requests_5xx: AtomicU64,
    /// Total request latency in microseconds
    pub http_request_latency_us_total: AtomicU64,

    // === Report pipeline ===
    /// Project metric snapshots recomputed
    pub metrics_recomputed: AtomicU64,
    /// Stat groups zeroed because their computation failed
    pub stat_groups_degraded: AtomicU64,
    /// Exports rendered in the requested format
    pub exports_generated: AtomicU64,
    /// Exports that fell back to JSON
    pub export_fallbacks: AtomicU64,

    // === Notifications ===
    pub notifications_created: AtomicU64,
}

impl Telemetry {
    /// Create a new instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            http_requests_2xx: AtomicU64::new(0),
            http_requests_4xx: AtomicU64::new(0),
            http_requests_5xx: AtomicU64::new(0),
            http_request_latency_us_total: AtomicU64::new(0),

            metrics_recomputed: AtomicU64::new(0),
            stat_groups_degraded: AtomicU64::new(0),
            exports_generated: AtomicU64::new(0),
            export_fallbacks: AtomicU64::new(0),

            notifications_created: AtomicU64::new(0),
        }
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, status_code: u16, latency: Duration) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);

        match status_code {
            200..=299 => self.http_requests_2xx.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.http_requests_4xx.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.http_requests_5xx.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };

        self.http_request_latency_us_total
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a project metrics recomputation.
    pub fn record_recompute(&self) {
        self.metrics_recomputed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stat group that was zeroed after a failure.
    pub fn record_degraded_group(&self) {
        self.stat_groups_degraded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished export.
    pub fn record_export(&self, fell_back: bool) {
        if fell_back {
            self.export_fallbacks.fetch_add(1, Ordering::Relaxed);
        } else {
            self.exports_generated.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a persisted notification.
    pub fn record_notification(&self) {
        self.notifications_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let requests = self.http_requests_total.load(Ordering::Relaxed);
        let latency_total = self.http_request_latency_us_total.load(Ordering::Relaxed);

        TelemetrySnapshot {
            http_requests_total: requests,
            http_requests_2xx: self.http_requests_2xx.load(Ordering::Relaxed),
            http_requests_4xx: self.http_requests_4xx.load(Ordering::Relaxed),
            http_requests_5xx: self.http_requests_5xx.load(Ordering::Relaxed),
            http_request_latency_avg_us: if requests > 0 { latency_total / requests } else { 0 },
            metrics_recomputed: self.metrics_recomputed.load(Ordering::Relaxed),
            stat_groups_degraded: self.stat_groups_degraded.load(Ordering::Relaxed),
            exports_generated: self.exports_generated.load(Ordering::Relaxed),
            export_fallbacks: self.export_fallbacks.load(Ordering::Relaxed),
            notifications_created: self.notifications_created.load(Ordering::Relaxed),
        }
    }

    /// Export counters in Prometheus text format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut output = String::new();

        output.push_str("# HELP mozsolidaria_http_requests_total Total HTTP requests\n");
        output.push_str("# TYPE mozsolidaria_http_requests_total counter\n");
        output.push_str(&format!("mozsolidaria_http_requests_total {}\n", s.http_requests_total));

        output.push_str("# HELP mozsolidaria_http_requests_by_status HTTP requests by status\n");
        output.push_str("# TYPE mozsolidaria_http_requests_by_status counter\n");
        for (class, value) in [
            ("2xx", s.http_requests_2xx),
            ("4xx", s.http_requests_4xx),
            ("5xx", s.http_requests_5xx),
        ] {
            output.push_str(&format!(
                "mozsolidaria_http_requests_by_status{{status=\"{class}\"}} {value}\n"
            ));
        }

        for (name, help, value) in [
            ("metrics_recomputed_total", "Project metric snapshots recomputed", s.metrics_recomputed),
            ("stat_groups_degraded_total", "Stat groups zeroed after a failure", s.stat_groups_degraded),
            ("exports_generated_total", "Exports rendered in the requested format", s.exports_generated),
            ("export_fallbacks_total", "Exports that fell back to JSON", s.export_fallbacks),
            ("notifications_created_total", "Notifications persisted", s.notifications_created),
        ] {
            output.push_str(&format!("# HELP mozsolidaria_{name} {help}\n"));
            output.push_str(&format!("# TYPE mozsolidaria_{name} counter\n"));
            output.push_str(&format!("mozsolidaria_{name} {value}\n"));
        }

        output
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of all counters at a point in time.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub http_requests_total: u64,
    pub http_requests_2xx: u64,
    pub http_requests_4xx: u64,
    pub http_requests_5xx: u64,
    pub http_request_latency_avg_us: u64,
    pub metrics_recomputed: u64,
    pub stat_groups_degraded: u64,
    pub exports_generated: u64,
    pub export_fallbacks: u64,
    pub notifications_created: u64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        let telemetry = Telemetry::new();

        telemetry.record_http_request(200, Duration::from_millis(50));
        telemetry.record_http_request(404, Duration::from_millis(10));
        telemetry.record_http_request(500, Duration::from_millis(30));

        let s = telemetry.snapshot();
        assert_eq!(s.http_requests_total, 3);
        assert_eq!(s.http_requests_2xx, 1);
        assert_eq!(s.http_requests_4xx, 1);
        assert_eq!(s.http_requests_5xx, 1);
        assert_eq!(s.http_request_latency_avg_us, 30_000);
    }

    #[test]
    fn test_export_counters_split_fallbacks() {
        let telemetry = Telemetry::new();
        telemetry.record_export(false);
        telemetry.record_export(true);
        telemetry.record_export(true);

        let s = telemetry.snapshot();
        assert_eq!(s.exports_generated, 1);
        assert_eq!(s.export_fallbacks, 2);
    }

    #[test]
    fn test_average_latency_empty() {
        assert_eq!(Telemetry::new().snapshot().http_request_latency_avg_us, 0);
    }

    #[test]
    fn test_prometheus_export() {
        let telemetry = Telemetry::new();
        telemetry.record_recompute();

        let output = telemetry.to_prometheus();
        assert!(output.contains("mozsolidaria_http_requests_total 0"));
        assert!(output.contains("mozsolidaria_metrics_recomputed_total 1"));
        assert!(output.contains("status=\"5xx\""));
    }
}
