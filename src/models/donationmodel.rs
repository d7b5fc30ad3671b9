// models/donationmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "donation_status", rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
}

/// A settled (or failed) donation row. Immutable once status is terminal.
///
/// For every completed donation:
/// artist_payout + platform_fee + affiliate_tier1_fee + affiliate_tier2_fee == amount
/// (all amounts in integer cents). Failed donations carry zero split fields.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub musician_id: Uuid,
    pub fan_id: Option<Uuid>,
    pub show_id: Option<Uuid>,
    pub song_id: Option<Uuid>,
    pub amount: i64, // in cents
    pub message: Option<String>,
    pub status: DonationStatus,
    pub transaction_id: Option<String>, // payment gateway reference
    pub artist_payout: i64,
    pub platform_fee: i64,
    pub affiliate_tier1_id: Option<Uuid>,
    pub affiliate_tier1_fee: i64,
    pub affiliate_tier2_id: Option<Uuid>,
    pub affiliate_tier2_fee: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl Donation {
    pub fn is_completed(&self) -> bool {
        self.status == DonationStatus::Completed
    }
}

/// What the submission handler hands to the settlement service, before any
/// split has been computed or the gateway consulted.
#[derive(Debug, Clone)]
pub struct DonationDraft {
    pub musician_id: Uuid,
    pub fan_id: Option<Uuid>,
    pub show_id: Option<Uuid>,
    pub song_id: Option<Uuid>,
    pub amount: i64,
    pub message: Option<String>,
    pub payment_authorization: String,
}
