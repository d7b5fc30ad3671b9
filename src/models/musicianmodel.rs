// models/musicianmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Musician {
    pub id: Uuid,
    pub display_name: String,
    pub referral_code: String,
    /// Payment-account setup finished; supplied by the external
    /// payment-account collaborator. Musicians with false cannot receive.
    pub payout_ready: bool,
    /// Display timezone as minutes east of UTC, used for the dashboard's
    /// calendar-day buckets.
    pub timezone_offset_minutes: i32,
    pub total_earnings: i64,  // lifetime artist payout, cents
    pub total_donations: i64, // lifetime completed-donation count
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Show {
    pub id: Uuid,
    pub musician_id: Uuid,
    pub title: String,
    pub total_donations: i64, // cents donated during this show
    pub donation_count: i64,
    pub created_at: Option<DateTime<Utc>>,
}
