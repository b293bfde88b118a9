//! API endpoints.

mod auth;
mod blog;
mod community;
mod donations;
mod metrics;
mod notifications;
mod partners;
mod projects;
mod reports;

use axum::Router;

use crate::middleware::AppState;

pub use reports::EXPORT_FALLBACK_HEADER;

/// Create the API router. Paths are relative to the `/api/v1` prefix.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", projects::router())
        .nest("/donations", donations::router())
        .nest("/volunteers", community::volunteers_router())
        .nest("/beneficiaries", community::beneficiaries_router())
        .nest("/partners", partners::router())
        .nest("/notifications", notifications::router())
        .nest("/blog", blog::router())
        .nest("/reports", reports::router())
        .nest("/health", metrics::health_router())
        .nest("/metrics", metrics::router())
}
