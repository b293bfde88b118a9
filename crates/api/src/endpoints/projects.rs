//! Project endpoints: projects, their updates, milestones and metrics.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use mozsolidaria_common::{AppError, AppResult};
use mozsolidaria_core::{
    CreateMilestoneInput, CreateProjectInput, CreateUpdateInput, UpdateMilestoneInput,
    UpdateProjectInput, UpdateUpdateInput,
};
use mozsolidaria_db::entities::{
    project::{self, ProjectStatus},
    project_metrics, project_milestone, project_update,
};
use serde::Deserialize;

use crate::{
    extractors::{MaybeAuthUser, StaffUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/{slug}",
            get(get_project)
                .put(replace_project)
                .patch(patch_project)
                .delete(delete_project),
        )
        .route("/{slug}/updates", get(list_updates).post(create_update))
        .route("/{slug}/updates/{id}", patch(update_update))
        .route(
            "/{slug}/milestones",
            get(list_milestones).post(create_milestone),
        )
        .route("/{slug}/milestones/{id}", patch(update_milestone))
        .route("/{slug}/metrics", get(get_metrics))
        .route("/{slug}/metrics/recompute", post(recompute_metrics))
}

#[derive(Debug, Deserialize)]
struct ListProjectsQuery {
    status: Option<ProjectStatus>,
}

async fn list_projects(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> AppResult<ApiResponse<Vec<project::Model>>> {
    let projects = state
        .project_service
        .list(query.status, caller.is_staff())
        .await?;
    Ok(ApiResponse::ok(projects))
}

/// Look up a project the caller may see. Private projects are staff-only.
async fn visible_project(
    state: &AppState,
    caller: &MaybeAuthUser,
    slug: &str,
) -> AppResult<project::Model> {
    let project = state.project_service.get(slug).await?;
    if project.is_public || caller.is_staff() {
        Ok(project)
    } else {
        Err(AppError::NotFound(format!("project {slug}")))
    }
}

async fn get_project(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<project::Model>> {
    Ok(ApiResponse::ok(visible_project(&state, &caller, &slug).await?))
}

async fn create_project(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> AppResult<ApiResponse<project::Model>> {
    let project = state.project_service.create(input).await?;
    Ok(ApiResponse::created(project))
}

async fn replace_project(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<CreateProjectInput>,
) -> AppResult<ApiResponse<project::Model>> {
    let project = state.project_service.replace(&slug, input).await?;
    Ok(ApiResponse::ok(project))
}

async fn patch_project(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<UpdateProjectInput>,
) -> AppResult<ApiResponse<project::Model>> {
    let project = state.project_service.patch(&slug, input).await?;
    Ok(ApiResponse::ok(project))
}

async fn delete_project(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.project_service.delete(&slug).await?;
    Ok(no_content())
}

// === Updates ===

async fn list_updates(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<Vec<project_update::Model>>> {
    visible_project(&state, &caller, &slug).await?;
    let updates = state
        .project_service
        .list_updates(&slug, !caller.is_staff())
        .await?;
    Ok(ApiResponse::ok(updates))
}

async fn create_update(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<CreateUpdateInput>,
) -> AppResult<ApiResponse<project_update::Model>> {
    let update = state
        .project_service
        .create_update(&slug, Some(&user.id), input)
        .await?;
    Ok(ApiResponse::created(update))
}

async fn update_update(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Json(input): Json<UpdateUpdateInput>,
) -> AppResult<ApiResponse<project_update::Model>> {
    let update = state
        .project_service
        .update_update(&slug, &id, input)
        .await?;
    Ok(ApiResponse::ok(update))
}

// === Milestones ===

async fn list_milestones(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<Vec<project_milestone::Model>>> {
    visible_project(&state, &caller, &slug).await?;
    let milestones = state.project_service.list_milestones(&slug).await?;
    Ok(ApiResponse::ok(milestones))
}

async fn create_milestone(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<CreateMilestoneInput>,
) -> AppResult<ApiResponse<project_milestone::Model>> {
    let milestone = state.project_service.create_milestone(&slug, input).await?;
    Ok(ApiResponse::created(milestone))
}

async fn update_milestone(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Json(input): Json<UpdateMilestoneInput>,
) -> AppResult<ApiResponse<project_milestone::Model>> {
    let milestone = state
        .project_service
        .update_milestone(&slug, &id, input)
        .await?;
    Ok(ApiResponse::ok(milestone))
}

// === Metrics ===

async fn get_metrics(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<project_metrics::Model>> {
    visible_project(&state, &caller, &slug).await?;
    let metrics = state.project_service.metrics(&slug).await?;
    Ok(ApiResponse::ok(metrics))
}

async fn recompute_metrics(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<project_metrics::Model>> {
    let metrics = state.project_service.recompute_metrics(&slug).await?;
    Ok(ApiResponse::ok(metrics))
}
