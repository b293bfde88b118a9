//! Report endpoints: aggregated statistics and exports.
//!
//! Stats require `view_reports`, exports require `export_reports`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mozsolidaria_common::AppResult;
use mozsolidaria_core::{
    AdvancedStats, EXPORT_REPORTS, ExportOptions, ExportOutput, ExportRequest, StatsPeriod,
    VIEW_REPORTS,
};
use serde::Deserialize;
use tracing::info;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Set on export responses that were rendered as JSON instead of the
/// requested format.
pub const EXPORT_FALLBACK_HEADER: &str = "x-export-fallback";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/exports/generate", post(generate_export))
        .route("/exports/{area}", post(export_area))
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    period: Option<String>,
}

async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<ApiResponse<AdvancedStats>> {
    state
        .permission_service
        .require_permission(&user, VIEW_REPORTS)
        .await?;

    let period = match query.period.as_deref() {
        Some(raw) => raw.parse()?,
        None => StatsPeriod::default(),
    };

    let stats = state.metrics_service.advanced_stats(period).await;
    Ok(ApiResponse::ok(stats))
}

async fn generate_export(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> AppResult<Response> {
    state
        .permission_service
        .require_permission(&user, EXPORT_REPORTS)
        .await?;

    let output = state.export_service.generate(request).await?;
    info!(
        user = %user.username,
        area = %output.area,
        format = %output.format,
        records = output.record_count,
        "Export generated"
    );
    Ok(export_response(output))
}

/// Body of `POST /reports/exports/{area}`; the area comes from the path.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AreaExportBody {
    format: Option<String>,
    filename: Option<String>,
    options: ExportOptions,
}

async fn export_area(
    user: AuthUser,
    state: State<AppState>,
    Path(area): Path<String>,
    body: Option<Json<AreaExportBody>>,
) -> AppResult<Response> {
    let Json(body) = body.unwrap_or_default();
    let request = ExportRequest {
        area,
        format: body.format.unwrap_or_else(|| "json".to_string()),
        filename: body.filename,
        options: body.options,
    };
    generate_export(user, state, Json(request)).await
}

fn export_response(output: ExportOutput) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", output.filename);
    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, output.content_type)],
        output.body,
    )
        .into_response();

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if output.fallback {
        headers.insert(
            HeaderName::from_static(EXPORT_FALLBACK_HEADER),
            HeaderValue::from_static("true"),
        );
    }

    response
}
