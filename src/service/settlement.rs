// service/settlement.rs
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, donationdb::DonationExt, musiciandb::MusicianExt},
    models::{
        affiliatemodel::ReferralChain,
        donationmodel::{Donation, DonationDraft},
    },
    service::{
        affiliate_graph::AffiliateGraph,
        error::ServiceError,
        events::DonationEventBus,
        fee_split::{compute_split, SplitRates},
        payment_gateway::PaymentGatewayService,
    },
    utils::{currency::format_cents_as_dollars, reference::generate_settlement_reference},
};

/// The system of record for donations. Validates, charges the gateway,
/// computes the split and commits donation + counters atomically, then
/// emits exactly one event per terminal donation.
#[derive(Debug, Clone)]
pub struct SettlementLedger {
    db_client: Arc<DBClient>,
    affiliate_graph: Arc<AffiliateGraph>,
    gateway: PaymentGatewayService,
    event_bus: DonationEventBus,
    rates: SplitRates,
    gateway_timeout: Duration,
}

impl SettlementLedger {
    pub fn new(
        db_client: Arc<DBClient>,
        affiliate_graph: Arc<AffiliateGraph>,
        gateway: PaymentGatewayService,
        event_bus: DonationEventBus,
        rates: SplitRates,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            db_client,
            affiliate_graph,
            gateway,
            event_bus,
            rates,
            gateway_timeout,
        }
    }

    /// Settle one donation end to end. The returned Donation is terminal:
    /// completed with its split, or failed with zero split fields when the
    /// gateway declined, was unreachable or timed out. Validation errors
    /// reject synchronously before anything is written.
    pub async fn settle(&self, draft: DonationDraft) -> Result<Donation, ServiceError> {
        if draft.amount <= 0 {
            return Err(ServiceError::InvalidAmount(draft.amount));
        }

        let musician = self
            .db_client
            .get_musician(draft.musician_id)
            .await?
            .ok_or(ServiceError::MusicianNotFound(draft.musician_id))?;

        if !musician.payout_ready {
            return Err(ServiceError::PayeeNotEligible(musician.id));
        }

        // A donation pinned to a show must name one of this musician's
        // shows; rejecting up front beats a foreign-key error mid-commit.
        if let Some(show_id) = draft.show_id {
            self.db_client
                .get_show(show_id)
                .await?
                .filter(|show| show.musician_id == draft.musician_id)
                .ok_or(ServiceError::ShowNotFound(show_id))?;
        }

        let reference = generate_settlement_reference();
        let charge = tokio::time::timeout(
            self.gateway_timeout,
            self.gateway
                .charge(&draft.payment_authorization, draft.amount, &reference),
        )
        .await;

        let transaction_id = match charge {
            Ok(Ok(result)) => result.transaction_id,
            Ok(Err(e)) => {
                tracing::warn!("charge failed for musician {}: {}", draft.musician_id, e);
                return self.record_failure(&draft, None).await;
            }
            Err(_elapsed) => {
                let timeout = ServiceError::GatewayTimeout(self.gateway_timeout.as_secs());
                tracing::warn!("charge failed for musician {}: {}", draft.musician_id, timeout);
                return self.record_failure(&draft, None).await;
            }
        };

        // Attribution is resolved against the musician's account, not the
        // payer. A resolution error only costs commissions, never the
        // donation itself.
        let chain = match self.affiliate_graph.resolve_chain(draft.musician_id).await {
            Ok(chain) => chain,
            Err(e) => {
                tracing::warn!(
                    "referral chain unresolved for musician {}: {}",
                    draft.musician_id,
                    e
                );
                ReferralChain::default()
            }
        };

        let split = compute_split(draft.amount, &chain, &self.rates);

        let donation = self
            .db_client
            .settle_completed_donation(&draft, &chain, &split, &transaction_id)
            .await?;

        tracing::info!(
            "settled donation {} for musician {}: {} of which {} to the artist",
            donation.id,
            donation.musician_id,
            format_cents_as_dollars(donation.amount),
            format_cents_as_dollars(donation.artist_payout)
        );

        // Emission only after the write is durable; delivery is
        // at-least-once and dedup is the subscriber's job.
        self.event_bus.publish(donation.clone()).await;

        Ok(donation)
    }

    /// Durable failed row, no counter increments, still one stream message.
    async fn record_failure(
        &self,
        draft: &DonationDraft,
        transaction_id: Option<&str>,
    ) -> Result<Donation, ServiceError> {
        let donation = self
            .db_client
            .save_failed_donation(draft, transaction_id)
            .await?;

        self.event_bus.publish(donation.clone()).await;

        Ok(donation)
    }

    pub async fn get_donation(&self, donation_id: Uuid) -> Result<Donation, ServiceError> {
        self.db_client
            .get_donation(donation_id)
            .await?
            .ok_or(ServiceError::DonationNotFound(donation_id))
    }
}
