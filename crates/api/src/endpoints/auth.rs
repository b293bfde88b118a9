//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::{get, post}};
use mozsolidaria_common::AppResult;
use mozsolidaria_core::{TokenRequest, TokenResponse, UserResponse};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token", post(issue_token))
        .route("/me", get(me))
}

/// Exchange username and password for a bearer token.
async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let token = state.user_service.issue_token(req).await?;
    Ok(ApiResponse::ok(token))
}

async fn me(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
}
