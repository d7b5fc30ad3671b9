// service/affiliate_graph.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{affiliatedb::AffiliateExt, db::DBClient, musiciandb::MusicianExt},
    models::affiliatemodel::{AffiliateEdge, ReferralChain},
    service::error::ServiceError,
};

/// An edge the planner decided to write: (parent, grandparent snapshot, level).
type PlannedEdge = (Uuid, Option<Uuid>, i16);

/// Given the referrer's own stored edges, plan the edges for a newly
/// referred user. Always a level-1 edge to the referrer; a level-2 edge to
/// the referrer's level-1 parent when one exists. The grandparent on the
/// level-1 row is a snapshot taken now, never re-pointed later.
pub fn plan_edges(referrer_id: Uuid, referrer_edges: &[AffiliateEdge]) -> Vec<PlannedEdge> {
    let grandparent = referrer_edges
        .iter()
        .find(|e| e.level == 1)
        .map(|e| e.parent_id);

    let mut planned = vec![(referrer_id, grandparent, 1)];
    if let Some(grandparent_id) = grandparent {
        planned.push((grandparent_id, None, 2));
    }
    planned
}

/// Owns the two-tier referral relation. Depth is bounded to two by how
/// edges are written, so resolution is a single indexed read, never a walk.
#[derive(Debug, Clone)]
pub struct AffiliateGraph {
    db_client: Arc<DBClient>,
}

impl AffiliateGraph {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    /// Direct and second-tier referrer of a user, either of which may be
    /// absent. Never returns a tier2 without a tier1.
    pub async fn resolve_chain(&self, user_id: Uuid) -> Result<ReferralChain, ServiceError> {
        let edges = self.db_client.get_affiliate_edges(user_id).await?;
        Ok(ReferralChain::from_edges(&edges))
    }

    /// Attach referral attribution for a freshly onboarded user.
    ///
    /// This is a non-critical side effect of onboarding: every failure mode
    /// (unresolvable code, self-referral, write conflict, db error) is
    /// logged and swallowed so the enclosing account-creation flow is never
    /// failed or delayed. Re-invocation for a user that already has edges
    /// is a no-op; a later, different referral code cannot overwrite the
    /// first attribution.
    pub async fn create_edges(&self, new_user_id: Uuid, referral_code: &str) {
        if let Err(e) = self.try_create_edges(new_user_id, referral_code).await {
            tracing::warn!(
                "referral attribution skipped for user {}: {}",
                new_user_id,
                e
            );
        }
    }

    async fn try_create_edges(
        &self,
        new_user_id: Uuid,
        referral_code: &str,
    ) -> Result<(), ServiceError> {
        let existing = self.db_client.get_affiliate_edges(new_user_id).await?;
        if !existing.is_empty() {
            tracing::debug!("user {} already has referral edges", new_user_id);
            return Ok(());
        }

        let referrer = match self
            .db_client
            .get_musician_by_referral_code(referral_code)
            .await?
        {
            Some(musician) => musician,
            None => {
                tracing::info!("referral code {} did not resolve", referral_code);
                return Ok(());
            }
        };

        if referrer.id == new_user_id {
            tracing::info!("ignoring self-referral for user {}", new_user_id);
            return Ok(());
        }

        let referrer_edges = self.db_client.get_affiliate_edges(referrer.id).await?;
        for (parent_id, grandparent_id, level) in plan_edges(referrer.id, &referrer_edges) {
            let written = self
                .db_client
                .insert_affiliate_edge(new_user_id, parent_id, grandparent_id, level)
                .await?;
            if !written {
                // Lost a race with a concurrent duplicate; first writer wins.
                tracing::debug!(
                    "level-{} edge for user {} already present",
                    level,
                    new_user_id
                );
            }
        }

        Ok(())
    }
}
