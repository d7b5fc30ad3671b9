// db/affiliatedb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::affiliatemodel::AffiliateEdge;

#[async_trait]
pub trait AffiliateExt {
    /// All stored edges for a user: at most one level-1 and one level-2 row.
    async fn get_affiliate_edges(&self, user_id: Uuid) -> Result<Vec<AffiliateEdge>, sqlx::Error>;

    /// Insert one edge. Conflicts on (user_id, level) are discarded rather
    /// than surfaced; the first writer wins and attribution is permanent.
    /// Returns whether a row was actually written.
    async fn insert_affiliate_edge(
        &self,
        user_id: Uuid,
        parent_id: Uuid,
        grandparent_id: Option<Uuid>,
        level: i16,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl AffiliateExt for DBClient {
    async fn get_affiliate_edges(&self, user_id: Uuid) -> Result<Vec<AffiliateEdge>, sqlx::Error> {
        sqlx::query_as::<_, AffiliateEdge>(
            r#"
            SELECT
                id,
                user_id,
                parent_id,
                grandparent_id,
                level,
                created_at
            FROM affiliate_edges
            WHERE user_id = $1
            ORDER BY level
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_affiliate_edge(
        &self,
        user_id: Uuid,
        parent_id: Uuid,
        grandparent_id: Option<Uuid>,
        level: i16,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO affiliate_edges (user_id, parent_id, grandparent_id, level)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, level) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(parent_id)
        .bind(grandparent_id)
        .bind(level)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
