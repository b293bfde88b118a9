//! Partner messaging and project assignments.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use mozsolidaria_common::AppResult;
use mozsolidaria_core::{CreateAssignmentInput, SendMessageInput};
use mozsolidaria_db::entities::{partner_message, partner_project_assignment};

use crate::{
    extractors::{AuthUser, StaffUser},
    middleware::AppState,
    response::ApiResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/assignments", post(create_assignment))
        .route("/{id}/messages", get(list_messages))
        .route("/{id}/assignments", get(list_assignments))
}

async fn send_message(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<ApiResponse<partner_message::Model>> {
    let message = state.partner_service.send_message(&user.id, input).await?;
    Ok(ApiResponse::created(message))
}

async fn create_assignment(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
    Json(input): Json<CreateAssignmentInput>,
) -> AppResult<ApiResponse<partner_project_assignment::Model>> {
    let assignment = state
        .partner_service
        .create_assignment(&user.id, input)
        .await?;
    Ok(ApiResponse::created(assignment))
}

async fn list_messages(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<partner_message::Model>>> {
    let messages = state.partner_service.list_messages(&id).await?;
    Ok(ApiResponse::ok(messages))
}

async fn list_assignments(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<partner_project_assignment::Model>>> {
    let assignments = state.partner_service.list_assignments(&id).await?;
    Ok(ApiResponse::ok(assignments))
}
