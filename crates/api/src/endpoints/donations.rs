//! Donation endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use chrono::NaiveDate;
use mozsolidaria_common::AppResult;
use mozsolidaria_core::{CreateDonationInput, UpdateDonationStatusInput};
use mozsolidaria_db::{
    entities::{
        donation::{self, DonationStatus},
        donation_method,
    },
    repositories::{DonationFilter, TimeWindow},
};
use serde::Deserialize;

use crate::{
    extractors::{MaybeAuthUser, StaffUser},
    middleware::AppState,
    response::ApiResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_donations).post(create_donation))
        .route("/methods", get(list_methods))
        .route("/{id}", patch(update_donation_status))
}

async fn list_methods(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<donation_method::Model>>> {
    let methods = state.donation_service.list_methods().await?;
    Ok(ApiResponse::ok(methods))
}

async fn create_donation(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDonationInput>,
) -> AppResult<ApiResponse<donation::Model>> {
    let donor_id = caller.0.as_ref().map(|u| u.id.as_str());
    let donation = state.donation_service.create(donor_id, input).await?;
    Ok(ApiResponse::created(donation))
}

async fn update_donation_status(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateDonationStatusInput>,
) -> AppResult<ApiResponse<donation::Model>> {
    let donation = state.donation_service.update_status(&id, input).await?;
    Ok(ApiResponse::ok(donation))
}

#[derive(Debug, Deserialize)]
struct ListDonationsQuery {
    status: Option<DonationStatus>,
    project_id: Option<String>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

impl ListDonationsQuery {
    fn into_filter(self) -> AppResult<DonationFilter> {
        Ok(DonationFilter {
            status: self.status,
            window: TimeWindow::from_dates(self.date_from, self.date_to)?,
            project_id: self.project_id,
        })
    }
}

async fn list_donations(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Query(query): Query<ListDonationsQuery>,
) -> AppResult<ApiResponse<Vec<donation::Model>>> {
    let filter = query.into_filter()?;
    let donations = state.donation_service.list(&filter).await?;
    Ok(ApiResponse::ok(donations))
}
