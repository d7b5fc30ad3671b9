// db/donationdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::affiliatemodel::ReferralChain;
use crate::models::donationmodel::{Donation, DonationDraft};
use crate::service::fee_split::FeeSplit;

#[async_trait]
pub trait DonationExt {
    /// Commit a completed donation and its split in one transaction: the
    /// donation row plus atomic counter increments on the musician and, if
    /// attached, the show. Increments are done in SQL (`counter = counter
    /// + $n`), never read-then-write, so concurrent settlements for the
    /// same musician cannot lose an update.
    async fn settle_completed_donation(
        &self,
        draft: &DonationDraft,
        chain: &ReferralChain,
        split: &FeeSplit,
        transaction_id: &str,
    ) -> Result<Donation, sqlx::Error>;

    /// Record a gateway-declined or unreachable settlement attempt as a
    /// durable failed row with zero-valued split fields. No counters move.
    async fn save_failed_donation(
        &self,
        draft: &DonationDraft,
        transaction_id: Option<&str>,
    ) -> Result<Donation, sqlx::Error>;

    async fn get_donation(&self, donation_id: Uuid) -> Result<Option<Donation>, sqlx::Error>;

    /// Sum of completed artist payouts in [from, to). Used for the today
    /// and monthly bootstrap totals and for each trailing chart day.
    async fn earnings_between(
        &self,
        musician_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error>;

    /// Distinct non-null fan ids across the musician's completed history;
    /// seeds the aggregator's seen-fan set.
    async fn distinct_fan_ids(&self, musician_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>;

    async fn recent_completed_donations(
        &self,
        musician_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Donation>, sqlx::Error>;
}

const DONATION_COLUMNS: &str = r#"
    id,
    musician_id,
    fan_id,
    show_id,
    song_id,
    amount,
    message,
    status,
    transaction_id,
    artist_payout,
    platform_fee,
    affiliate_tier1_id,
    affiliate_tier1_fee,
    affiliate_tier2_id,
    affiliate_tier2_fee,
    created_at
"#;

#[async_trait]
impl DonationExt for DBClient {
    async fn settle_completed_donation(
        &self,
        draft: &DonationDraft,
        chain: &ReferralChain,
        split: &FeeSplit,
        transaction_id: &str,
    ) -> Result<Donation, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let donation = sqlx::query_as::<_, Donation>(&format!(
            r#"
            INSERT INTO donations
            (musician_id, fan_id, show_id, song_id, amount, message, status,
             transaction_id, artist_payout, platform_fee,
             affiliate_tier1_id, affiliate_tier1_fee,
             affiliate_tier2_id, affiliate_tier2_fee)
            VALUES ($1, $2, $3, $4, $5, $6, 'completed'::donation_status,
                    $7, $8, $9, $10, $11, $12, $13)
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(draft.musician_id)
        .bind(draft.fan_id)
        .bind(draft.show_id)
        .bind(draft.song_id)
        .bind(draft.amount)
        .bind(draft.message.as_deref())
        .bind(transaction_id)
        .bind(split.artist_payout)
        .bind(split.platform_fee)
        .bind(chain.tier1)
        .bind(split.tier1_fee)
        .bind(chain.tier2)
        .bind(split.tier2_fee)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE musicians
            SET total_earnings = total_earnings + $2,
                total_donations = total_donations + 1
            WHERE id = $1
            "#,
        )
        .bind(draft.musician_id)
        .bind(split.artist_payout)
        .execute(&mut *tx)
        .await?;

        if let Some(show_id) = draft.show_id {
            sqlx::query(
                r#"
                UPDATE shows
                SET total_donations = total_donations + $2,
                    donation_count = donation_count + 1
                WHERE id = $1
                "#,
            )
            .bind(show_id)
            .bind(draft.amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(donation)
    }

    async fn save_failed_donation(
        &self,
        draft: &DonationDraft,
        transaction_id: Option<&str>,
    ) -> Result<Donation, sqlx::Error> {
        sqlx::query_as::<_, Donation>(&format!(
            r#"
            INSERT INTO donations
            (musician_id, fan_id, show_id, song_id, amount, message, status,
             transaction_id, artist_payout, platform_fee,
             affiliate_tier1_fee, affiliate_tier2_fee)
            VALUES ($1, $2, $3, $4, $5, $6, 'failed'::donation_status,
                    $7, 0, 0, 0, 0)
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(draft.musician_id)
        .bind(draft.fan_id)
        .bind(draft.show_id)
        .bind(draft.song_id)
        .bind(draft.amount)
        .bind(draft.message.as_deref())
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_donation(&self, donation_id: Uuid) -> Result<Option<Donation>, sqlx::Error> {
        sqlx::query_as::<_, Donation>(&format!(
            r#"
            SELECT {DONATION_COLUMNS}
            FROM donations
            WHERE id = $1
            "#
        ))
        .bind(donation_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn earnings_between(
        &self,
        musician_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(artist_payout), 0)::BIGINT
            FROM donations
            WHERE musician_id = $1
              AND status = 'completed'::donation_status
              AND created_at >= $2
              AND created_at < $3
            "#,
        )
        .bind(musician_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
    }

    async fn distinct_fan_ids(&self, musician_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT fan_id
            FROM donations
            WHERE musician_id = $1
              AND status = 'completed'::donation_status
              AND fan_id IS NOT NULL
            "#,
        )
        .bind(musician_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn recent_completed_donations(
        &self,
        musician_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Donation>, sqlx::Error> {
        sqlx::query_as::<_, Donation>(&format!(
            r#"
            SELECT {DONATION_COLUMNS}
            FROM donations
            WHERE musician_id = $1
              AND status = 'completed'::donation_status
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(musician_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
