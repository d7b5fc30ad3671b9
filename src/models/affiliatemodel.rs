// models/affiliatemodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One referral edge. `level` 1 points at the direct referrer, level 2 at
/// the referrer's own parent as it was when this edge was created (a
/// snapshot, never re-pointed afterwards). At most one edge per level per
/// user, enforced by a unique constraint on (user_id, level).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AffiliateEdge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Uuid,
    pub grandparent_id: Option<Uuid>,
    pub level: i16,
    pub created_at: Option<DateTime<Utc>>,
}

/// Resolved commission recipients for a musician. Depth is bounded to two
/// by construction of the edge table; there is nothing to walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferralChain {
    pub tier1: Option<Uuid>,
    pub tier2: Option<Uuid>,
}

impl ReferralChain {
    /// Build a chain from a user's stored edges. A level-2 edge without a
    /// matching level-1 edge is ignored rather than surfaced: a tier-2
    /// commission is only ever paid on top of a tier-1 one.
    pub fn from_edges(edges: &[AffiliateEdge]) -> Self {
        let tier1 = edges.iter().find(|e| e.level == 1).map(|e| e.parent_id);
        let tier2 = match tier1 {
            Some(_) => edges.iter().find(|e| e.level == 2).map(|e| e.parent_id),
            None => None,
        };
        ReferralChain { tier1, tier2 }
    }

    pub fn is_empty(&self) -> bool {
        self.tier1.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(user: Uuid, parent: Uuid, level: i16) -> AffiliateEdge {
        AffiliateEdge {
            id: Uuid::new_v4(),
            user_id: user,
            parent_id: parent,
            grandparent_id: None,
            level,
            created_at: None,
        }
    }

    #[test]
    fn chain_from_both_levels() {
        let user = Uuid::new_v4();
        let referrer = Uuid::new_v4();
        let grandparent = Uuid::new_v4();
        let chain = ReferralChain::from_edges(&[
            edge(user, referrer, 1),
            edge(user, grandparent, 2),
        ]);
        assert_eq!(chain.tier1, Some(referrer));
        assert_eq!(chain.tier2, Some(grandparent));
    }

    #[test]
    fn chain_never_has_tier2_without_tier1() {
        let user = Uuid::new_v4();
        let grandparent = Uuid::new_v4();
        // A level-2 edge alone is unreachable through create_edges, but the
        // resolver must still refuse to pay tier2 without tier1.
        let chain = ReferralChain::from_edges(&[edge(user, grandparent, 2)]);
        assert_eq!(chain.tier1, None);
        assert_eq!(chain.tier2, None);
    }

    #[test]
    fn chain_from_no_edges_is_empty() {
        let chain = ReferralChain::from_edges(&[]);
        assert!(chain.is_empty());
        assert_eq!(chain.tier2, None);
    }
}
