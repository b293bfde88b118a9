//! Operational endpoints: health check and telemetry export.

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use mozsolidaria_common::{TelemetrySnapshot, get_telemetry};
use serde::Serialize;

use crate::middleware::AppState;

/// Routes mounted at `/metrics`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_metrics_json))
        .route("/prometheus", get(get_metrics_prometheus))
}

/// Route mounted at `/health`.
pub fn health_router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// JSON telemetry response.
#[derive(Serialize)]
pub struct MetricsResponse {
    pub http: HttpMetrics,
    pub reports: ReportMetrics,
    pub notifications_created: u64,
}

#[derive(Serialize)]
pub struct HttpMetrics {
    pub requests_total: u64,
    pub requests_2xx: u64,
    pub requests_4xx: u64,
    pub requests_5xx: u64,
    pub latency_avg_us: u64,
}

#[derive(Serialize)]
pub struct ReportMetrics {
    pub metrics_recomputed: u64,
    pub stat_groups_degraded: u64,
    pub exports_generated: u64,
    pub export_fallbacks: u64,
}

impl From<TelemetrySnapshot> for MetricsResponse {
    fn from(s: TelemetrySnapshot) -> Self {
        Self {
            http: HttpMetrics {
                requests_total: s.http_requests_total,
                requests_2xx: s.http_requests_2xx,
                requests_4xx: s.http_requests_4xx,
                requests_5xx: s.http_requests_5xx,
                latency_avg_us: s.http_request_latency_avg_us,
            },
            reports: ReportMetrics {
                metrics_recomputed: s.metrics_recomputed,
                stat_groups_degraded: s.stat_groups_degraded,
                exports_generated: s.exports_generated,
                export_fallbacks: s.export_fallbacks,
            },
            notifications_created: s.notifications_created,
        }
    }
}

async fn get_metrics_json() -> Json<MetricsResponse> {
    Json(MetricsResponse::from(get_telemetry().snapshot()))
}

async fn get_metrics_prometheus() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        get_telemetry().to_prometheus(),
    )
        .into_response()
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_response_from_snapshot() {
        let snapshot = TelemetrySnapshot {
            http_requests_total: 100,
            http_requests_2xx: 90,
            http_requests_4xx: 8,
            http_requests_5xx: 2,
            http_request_latency_avg_us: 1500,
            metrics_recomputed: 12,
            stat_groups_degraded: 1,
            exports_generated: 7,
            export_fallbacks: 2,
            notifications_created: 30,
        };

        let response = MetricsResponse::from(snapshot);

        assert_eq!(response.http.requests_total, 100);
        assert_eq!(response.http.requests_5xx, 2);
        assert_eq!(response.reports.export_fallbacks, 2);
        assert_eq!(response.notifications_created, 30);
    }
}
