//! Notifications endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use mozsolidaria_common::AppResult;
use mozsolidaria_core::{CreateNotificationInput, NotificationResponse};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, StaffUser},
    middleware::AppState,
    response::ApiResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListNotificationsQuery {
    /// Maximum results (default: 20, max: 100)
    #[serde(default = "default_limit")]
    limit: u64,
    /// Cursor for pagination (before this ID)
    until_id: Option<String>,
    #[serde(default)]
    unread_only: bool,
}

const fn default_limit() -> u64 {
    20
}

#[derive(Serialize)]
struct CountResponse {
    count: u64,
}

async fn list_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let notifications = state
        .notification_service
        .list(
            &user.id,
            query.limit,
            query.until_id.as_deref(),
            query.unread_only,
        )
        .await?;
    Ok(ApiResponse::ok(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

async fn create_notification(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Json(input): Json<CreateNotificationInput>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    let created = state
        .notification_service
        .create(&input.recipient_id, input.draft)
        .await?;
    Ok(ApiResponse::created(created.into()))
}

async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.unread_count(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    let notification = state.notification_service.mark_read(&user.id, &id).await?;
    Ok(ApiResponse::ok(notification.into()))
}

async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.mark_all_read(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}
