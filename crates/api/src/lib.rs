//! HTTP API layer for the Moz Solidária backend.
//!
//! This crate provides the REST API mounted under `/api/v1`:
//!
//! - **Endpoints**: projects, donations, community, partners, notifications,
//!   blog and reports
//! - **Extractors**: Authentication and staff checks
//! - **Middleware**: Bearer-token authentication and request telemetry
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state};

pub use endpoints::{EXPORT_FALLBACK_HEADER, router};
pub use middleware::AppState;

/// Prefix every endpoint is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// The full API application: versioned routes plus authentication and
/// telemetry layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(API_PREFIX, router())
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .layer(from_fn(middleware::telemetry_middleware))
        .with_state(state)
}
