// service/fee_split.rs
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::affiliatemodel::ReferralChain;

/// Fee policy in basis points of the donation amount.
#[derive(Debug, Clone, Copy)]
pub struct SplitRates {
    pub platform_bps: i64,
    pub tier1_bps: i64,
    pub tier2_bps: i64,
    /// Where an absent affiliate tier's share goes. False (default): the
    /// share stays with the artist. True: it is kept as platform fee.
    /// Flagged as a product policy choice, hence configurable.
    pub absent_tier_to_platform: bool,
}

impl Default for SplitRates {
    fn default() -> Self {
        SplitRates {
            platform_bps: 1000, // 10%
            tier1_bps: 500,     // 5%
            tier2_bps: 100,     // 1%
            absent_tier_to_platform: false,
        }
    }
}

impl SplitRates {
    pub fn from_config(config: &Config) -> Self {
        SplitRates {
            platform_bps: config.platform_fee_bps,
            tier1_bps: config.tier1_fee_bps,
            tier2_bps: config.tier2_fee_bps,
            absent_tier_to_platform: config.absent_tier_to_platform,
        }
    }
}

/// Immutable split of one donation amount. Fields always sum to the amount
/// they were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub artist_payout: i64,
    pub platform_fee: i64,
    pub tier1_fee: i64,
    pub tier2_fee: i64,
}

impl FeeSplit {
    pub fn zero() -> Self {
        FeeSplit {
            artist_payout: 0,
            platform_fee: 0,
            tier1_fee: 0,
            tier2_fee: 0,
        }
    }

    pub fn total(&self) -> i64 {
        self.artist_payout + self.platform_fee + self.tier1_fee + self.tier2_fee
    }
}

fn fee_floor(amount: i64, bps: i64) -> i64 {
    amount * bps / 10_000
}

/// Split a donation amount into platform fee, affiliate commissions and
/// artist payout. Pure and total: no I/O, same inputs give the same split.
///
/// Each percentage rounds down to the nearest cent; the rounding remainder
/// lands in `artist_payout`, so the fields sum to `amount` exactly. A tier
/// with no resolved recipient earns nothing; its share follows the
/// `absent_tier_to_platform` policy.
pub fn compute_split(amount: i64, chain: &ReferralChain, rates: &SplitRates) -> FeeSplit {
    let mut platform_fee = fee_floor(amount, rates.platform_bps);

    let tier1_share = fee_floor(amount, rates.tier1_bps);
    let tier2_share = fee_floor(amount, rates.tier2_bps);

    let tier1_fee = if chain.tier1.is_some() { tier1_share } else { 0 };
    // Tier-2 pays out only on top of a resolved tier-1; ReferralChain
    // already guarantees tier2 implies tier1.
    let tier2_fee = if chain.tier2.is_some() { tier2_share } else { 0 };

    if rates.absent_tier_to_platform {
        if chain.tier1.is_none() {
            platform_fee += tier1_share;
        }
        if chain.tier2.is_none() {
            platform_fee += tier2_share;
        }
    }

    let artist_payout = amount - platform_fee - tier1_fee - tier2_fee;

    FeeSplit {
        artist_payout,
        platform_fee,
        tier1_fee,
        tier2_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn full_chain() -> ReferralChain {
        ReferralChain {
            tier1: Some(Uuid::new_v4()),
            tier2: Some(Uuid::new_v4()),
        }
    }

    fn tier1_only() -> ReferralChain {
        ReferralChain {
            tier1: Some(Uuid::new_v4()),
            tier2: None,
        }
    }

    #[test]
    fn ten_dollar_donation_with_full_chain() {
        let split = compute_split(1000, &full_chain(), &SplitRates::default());
        assert_eq!(split.platform_fee, 100);
        assert_eq!(split.tier1_fee, 50);
        assert_eq!(split.tier2_fee, 10);
        assert_eq!(split.artist_payout, 840);
    }

    #[test]
    fn ten_dollar_donation_with_no_chain() {
        let split = compute_split(1000, &ReferralChain::default(), &SplitRates::default());
        assert_eq!(split.platform_fee, 100);
        assert_eq!(split.tier1_fee, 0);
        assert_eq!(split.tier2_fee, 0);
        assert_eq!(split.artist_payout, 900);
    }

    #[test]
    fn tier1_only_chain_earns_no_tier2_fee() {
        let split = compute_split(1000, &tier1_only(), &SplitRates::default());
        assert_eq!(split.tier1_fee, 50);
        assert_eq!(split.tier2_fee, 0);
        assert_eq!(split.artist_payout, 850);
    }

    #[test]
    fn absent_tier_share_can_stay_with_platform() {
        let rates = SplitRates {
            absent_tier_to_platform: true,
            ..SplitRates::default()
        };
        let split = compute_split(1000, &ReferralChain::default(), &rates);
        assert_eq!(split.platform_fee, 160);
        assert_eq!(split.artist_payout, 840);
        assert_eq!(split.total(), 1000);
    }

    #[test]
    fn split_never_leaks_a_cent() {
        // Sweep awkward amounts across the supported range; the fields must
        // sum back to the amount for every chain shape and policy.
        let chains = [ReferralChain::default(), tier1_only(), full_chain()];
        let policies = [false, true];
        let mut amount: i64 = 1;
        while amount <= 10_000_000 {
            for chain in &chains {
                for &absent_tier_to_platform in &policies {
                    let rates = SplitRates {
                        absent_tier_to_platform,
                        ..SplitRates::default()
                    };
                    let split = compute_split(amount, chain, &rates);
                    assert_eq!(split.total(), amount, "leak at amount {}", amount);
                    assert!(split.artist_payout >= 0);
                }
            }
            // Dense at the low end where rounding bites, sparser above.
            amount = if amount < 10_000 { amount + 1 } else { amount + 997 };
        }
    }

    #[test]
    fn rounding_remainder_goes_to_artist() {
        // 99 cents: 10% floors to 9, 5% to 4, 1% to 0.
        let split = compute_split(99, &full_chain(), &SplitRates::default());
        assert_eq!(split.platform_fee, 9);
        assert_eq!(split.tier1_fee, 4);
        assert_eq!(split.tier2_fee, 0);
        assert_eq!(split.artist_payout, 86);
    }

    #[test]
    fn split_is_deterministic() {
        let chain = full_chain();
        let rates = SplitRates::default();
        assert_eq!(
            compute_split(123_457, &chain, &rates),
            compute_split(123_457, &chain, &rates)
        );
    }
}
