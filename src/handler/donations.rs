// handler/donations.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::donationdtos::{ApiResponse, DonationResponseDto, SubmitDonationDto},
    error::HttpError,
    models::donationmodel::DonationStatus,
    AppState,
};

pub fn donations_handler() -> Router {
    Router::new()
        .route("/", post(submit_donation))
        .route("/:donation_id", get(get_donation))
}

/// Donation submission from the payment/UI collaborator. The response
/// always carries the terminal Donation: completed with its split, or
/// failed when the gateway declined or could not be reached.
pub async fn submit_donation(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SubmitDonationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let donation = app_state.settlement_ledger.settle(body.into()).await?;

    let message = match donation.status {
        DonationStatus::Completed => "Donation settled successfully",
        _ => "Donation could not be completed",
    };

    let response: DonationResponseDto = donation.into();
    Ok(Json(ApiResponse::success(message, response)))
}

pub async fn get_donation(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(donation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let donation = app_state.settlement_ledger.get_donation(donation_id).await?;

    let response: DonationResponseDto = donation.into();
    Ok(Json(ApiResponse::success(
        "Donation retrieved successfully",
        response,
    )))
}
