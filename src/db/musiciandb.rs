// db/musiciandb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::musicianmodel::{Musician, Show};

#[async_trait]
pub trait MusicianExt {
    async fn get_musician(&self, musician_id: Uuid) -> Result<Option<Musician>, sqlx::Error>;

    async fn get_musician_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<Musician>, sqlx::Error>;

    async fn get_show(&self, show_id: Uuid) -> Result<Option<Show>, sqlx::Error>;
}

#[async_trait]
impl MusicianExt for DBClient {
    async fn get_musician(&self, musician_id: Uuid) -> Result<Option<Musician>, sqlx::Error> {
        sqlx::query_as::<_, Musician>(
            r#"
            SELECT
                id,
                display_name,
                referral_code,
                payout_ready,
                timezone_offset_minutes,
                total_earnings,
                total_donations,
                created_at
            FROM musicians
            WHERE id = $1
            "#,
        )
        .bind(musician_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_musician_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<Musician>, sqlx::Error> {
        sqlx::query_as::<_, Musician>(
            r#"
            SELECT
                id,
                display_name,
                referral_code,
                payout_ready,
                timezone_offset_minutes,
                total_earnings,
                total_donations,
                created_at
            FROM musicians
            WHERE referral_code = $1
            "#,
        )
        .bind(referral_code)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_show(&self, show_id: Uuid) -> Result<Option<Show>, sqlx::Error> {
        sqlx::query_as::<_, Show>(
            r#"
            SELECT
                id,
                musician_id,
                title,
                total_donations,
                donation_count,
                created_at
            FROM shows
            WHERE id = $1
            "#,
        )
        .bind(show_id)
        .fetch_optional(&self.pool)
        .await
    }
}
