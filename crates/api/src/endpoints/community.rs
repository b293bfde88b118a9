//! Volunteer and beneficiary registration.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use mozsolidaria_common::AppResult;
use mozsolidaria_core::{RegisterBeneficiaryInput, RegisterVolunteerInput};
use mozsolidaria_db::entities::{
    beneficiary_profile::{self, BeneficiaryStatus},
    volunteer_profile::{self, VolunteerStatus},
};
use serde::Deserialize;

use crate::{
    extractors::{MaybeAuthUser, StaffUser},
    middleware::AppState,
    response::ApiResponse,
};

pub fn volunteers_router() -> Router<AppState> {
    Router::new().route("/", get(list_volunteers).post(register_volunteer))
}

pub fn beneficiaries_router() -> Router<AppState> {
    Router::new().route("/", get(list_beneficiaries).post(register_beneficiary))
}

#[derive(Debug, Deserialize)]
struct StatusQuery<T> {
    status: Option<T>,
}

async fn list_volunteers(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Query(query): Query<StatusQuery<VolunteerStatus>>,
) -> AppResult<ApiResponse<Vec<volunteer_profile::Model>>> {
    let volunteers = state.community_service.list_volunteers(query.status).await?;
    Ok(ApiResponse::ok(volunteers))
}

async fn register_volunteer(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Json(input): Json<RegisterVolunteerInput>,
) -> AppResult<ApiResponse<volunteer_profile::Model>> {
    let user_id = caller.0.as_ref().map(|u| u.id.as_str());
    let volunteer = state
        .community_service
        .register_volunteer(user_id, input)
        .await?;
    Ok(ApiResponse::created(volunteer))
}

async fn list_beneficiaries(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Query(query): Query<StatusQuery<BeneficiaryStatus>>,
) -> AppResult<ApiResponse<Vec<beneficiary_profile::Model>>> {
    let beneficiaries = state
        .community_service
        .list_beneficiaries(query.status)
        .await?;
    Ok(ApiResponse::ok(beneficiaries))
}

async fn register_beneficiary(
    State(state): State<AppState>,
    Json(input): Json<RegisterBeneficiaryInput>,
) -> AppResult<ApiResponse<beneficiary_profile::Model>> {
    let beneficiary = state.community_service.register_beneficiary(input).await?;
    Ok(ApiResponse::created(beneficiary))
}
