// handler/referrals.rs
use std::sync::Arc;

use axum::{response::IntoResponse, routing::post, Extension, Json, Router};
use validator::Validate;

use crate::{
    dtos::donationdtos::{ApiResponse, ReferralAttributionDto},
    error::HttpError,
    AppState,
};

pub fn referrals_handler() -> Router {
    Router::new().route("/attribution", post(attach_referral))
}

/// Called by the onboarding collaborator when a new account finishes
/// signup with a referral code. Attribution is best-effort: an unresolved
/// code or a lost write race is logged inside the graph and this still
/// reports success, so onboarding is never failed by it.
pub async fn attach_referral(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ReferralAttributionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state
        .affiliate_graph
        .create_edges(body.new_user_id, &body.referral_code)
        .await;

    Ok(Json(ApiResponse::success(
        "Referral attribution recorded",
        (),
    )))
}
