//! Blog endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use mozsolidaria_common::AppResult;
use mozsolidaria_core::{AddCommentInput, CreatePostInput};
use mozsolidaria_db::entities::{blog_post, comment};
use serde::Deserialize;

use crate::{extractors::StaffUser, middleware::AppState, response::ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{slug}", get(get_post))
        .route("/posts/{slug}/comments", get(list_comments).post(add_comment))
        .route("/comments/{id}/approve", post(approve_comment))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default = "default_limit")]
    limit: u64,
    #[serde(default)]
    offset: u64,
}

const fn default_limit() -> u64 {
    10
}

async fn list_posts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<ApiResponse<Vec<blog_post::Model>>> {
    let posts = state
        .blog_service
        .list_published(page.limit, page.offset)
        .await?;
    Ok(ApiResponse::ok(posts))
}

async fn create_post(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<blog_post::Model>> {
    let post = state.blog_service.create_post(&user.id, input).await?;
    Ok(ApiResponse::created(post))
}

async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<blog_post::Model>> {
    let post = state.blog_service.read_post(&slug).await?;
    Ok(ApiResponse::ok(post))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<Vec<comment::Model>>> {
    let comments = state.blog_service.list_comments(&slug).await?;
    Ok(ApiResponse::ok(comments))
}

async fn add_comment(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<AddCommentInput>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state.blog_service.add_comment(&slug, input).await?;
    Ok(ApiResponse::created(comment))
}

async fn approve_comment(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state.blog_service.approve_comment(&id).await?;
    Ok(ApiResponse::ok(comment))
}
