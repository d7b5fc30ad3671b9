// dtos/donationdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::donationmodel::{Donation, DonationDraft, DonationStatus};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDonationDto {
    pub musician_id: Uuid,

    pub fan_id: Option<Uuid>,

    pub show_id: Option<Uuid>,

    pub song_id: Option<Uuid>,

    /// Positive integer minor units (cents).
    #[validate(range(min = 1, message = "Amount must be at least 1 cent"))]
    pub amount: i64,

    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub message: Option<String>,

    #[validate(length(min = 1, message = "Payment authorization is required"))]
    pub payment_authorization: String,
}

impl From<SubmitDonationDto> for DonationDraft {
    fn from(dto: SubmitDonationDto) -> Self {
        DonationDraft {
            musician_id: dto.musician_id,
            fan_id: dto.fan_id,
            show_id: dto.show_id,
            song_id: dto.song_id,
            amount: dto.amount,
            message: dto.message,
            payment_authorization: dto.payment_authorization,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DonationResponseDto {
    pub id: Uuid,
    pub musician_id: Uuid,
    pub fan_id: Option<Uuid>,
    pub show_id: Option<Uuid>,
    pub song_id: Option<Uuid>,
    pub amount: i64,
    pub message: Option<String>,
    pub status: DonationStatus,
    pub transaction_id: Option<String>,
    pub artist_payout: i64,
    pub platform_fee: i64,
    pub affiliate_tier1_id: Option<Uuid>,
    pub affiliate_tier1_fee: i64,
    pub affiliate_tier2_id: Option<Uuid>,
    pub affiliate_tier2_fee: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Donation> for DonationResponseDto {
    fn from(donation: Donation) -> Self {
        Self {
            id: donation.id,
            musician_id: donation.musician_id,
            fan_id: donation.fan_id,
            show_id: donation.show_id,
            song_id: donation.song_id,
            amount: donation.amount,
            message: donation.message,
            status: donation.status,
            transaction_id: donation.transaction_id,
            artist_payout: donation.artist_payout,
            platform_fee: donation.platform_fee,
            affiliate_tier1_id: donation.affiliate_tier1_id,
            affiliate_tier1_fee: donation.affiliate_tier1_fee,
            affiliate_tier2_id: donation.affiliate_tier2_id,
            affiliate_tier2_fee: donation.affiliate_tier2_fee,
            created_at: donation.created_at,
        }
    }
}

/// Onboarding collaborator payload; the code resolves to a referrer here.
#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ReferralAttributionDto {
    pub new_user_id: Uuid,

    #[validate(length(min = 1, message = "Referral code is required"))]
    pub referral_code: String,
}

// Response wrappers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}
