// service/events.rs
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::models::donationmodel::Donation;

/// One message per terminal donation, pushed to every dashboard subscribed
/// to that musician. `seq` increases by exactly one per musician, so a
/// consumer that sees a gap knows it missed events and must re-bootstrap.
#[derive(Debug, Clone)]
pub struct DonationEvent {
    pub seq: u64,
    pub donation: Donation,
}

struct MusicianChannel {
    tx: broadcast::Sender<DonationEvent>,
    next_seq: u64,
}

/// Fan-out of settled-donation events, one broadcast channel per musician.
///
/// Per-channel ordering gives the FIFO-per-musician guarantee the
/// aggregator's dedup and stale-day checks rely on; there is no ordering
/// across musicians. Publishing never blocks and never fails the ledger:
/// a send with no live subscriber is simply dropped, and slow subscribers
/// that overflow the channel buffer are lagged (they detect that through
/// the sequence gap and re-bootstrap).
#[derive(Debug, Clone)]
pub struct DonationEventBus {
    channels: Arc<RwLock<HashMap<Uuid, MusicianChannel>>>,
    capacity: usize,
}

impl std::fmt::Debug for MusicianChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicianChannel")
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl DonationEventBus {
    pub fn new(capacity: usize) -> Self {
        DonationEventBus {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Fire-and-forget emission after ledger commit.
    pub async fn publish(&self, donation: Donation) {
        let musician_id = donation.musician_id;
        let mut channels = self.channels.write().await;
        let send_failed = {
            let channel = channels.entry(musician_id).or_insert_with(|| {
                let (tx, _rx) = broadcast::channel(self.capacity);
                MusicianChannel { tx, next_seq: 1 }
            });

            let event = DonationEvent {
                seq: channel.next_seq,
                donation,
            };
            channel.next_seq += 1;
            channel.tx.send(event).is_err()
        };

        // No receivers is fine; the ledger must not care. The entry is
        // evicted so the map only holds channels with live dashboards;
        // the next subscriber gets a fresh sequence and bootstraps anyway.
        if send_failed {
            channels.remove(&musician_id);
            tracing::debug!("no live subscriber for musician {}", musician_id);
        }
    }

    pub async fn subscribe(&self, musician_id: Uuid) -> broadcast::Receiver<DonationEvent> {
        let mut channels = self.channels.write().await;
        let channel = channels.entry(musician_id).or_insert_with(|| {
            let (tx, _rx) = broadcast::channel(self.capacity);
            MusicianChannel { tx, next_seq: 1 }
        });
        channel.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::donationmodel::DonationStatus;

    fn donation(musician_id: Uuid) -> Donation {
        Donation {
            id: Uuid::new_v4(),
            musician_id,
            fan_id: None,
            show_id: None,
            song_id: None,
            amount: 1000,
            message: None,
            status: DonationStatus::Completed,
            transaction_id: Some("tx".to_string()),
            artist_payout: 900,
            platform_fee: 100,
            affiliate_tier1_id: None,
            affiliate_tier1_fee: 0,
            affiliate_tier2_id: None,
            affiliate_tier2_fee: 0,
            created_at: Some(chrono::Utc::now()),
        }
    }

    #[tokio::test]
    async fn events_are_fifo_per_musician_with_contiguous_seq() {
        let bus = DonationEventBus::new(16);
        let musician = Uuid::new_v4();
        let mut rx = bus.subscribe(musician).await;

        for _ in 0..3 {
            bus.publish(donation(musician)).await;
        }

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        let third = rx.recv().await.unwrap();
        assert_eq!((first.seq, second.seq, third.seq), (1, 2, 3));
    }

    #[tokio::test]
    async fn publish_without_subscriber_drops_the_channel() {
        let bus = DonationEventBus::new(4);
        let musician = Uuid::new_v4();
        bus.publish(donation(musician)).await;

        // The unheard publish evicted the entry; a later subscriber gets
        // a fresh sequence and owes the earlier donation to its bootstrap.
        let mut rx = bus.subscribe(musician).await;
        bus.publish(donation(musician)).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.seq, 1);
    }

    #[tokio::test]
    async fn dropped_subscriber_is_evicted_on_next_publish() {
        let bus = DonationEventBus::new(4);
        let musician = Uuid::new_v4();

        let rx = bus.subscribe(musician).await;
        bus.publish(donation(musician)).await;
        drop(rx);
        bus.publish(donation(musician)).await;

        let mut rx = bus.subscribe(musician).await;
        bus.publish(donation(musician)).await;
        assert_eq!(rx.recv().await.unwrap().seq, 1);
    }

    #[tokio::test]
    async fn resubscribe_skips_events_already_buffered() {
        let bus = DonationEventBus::new(16);
        let musician = Uuid::new_v4();
        let rx = bus.subscribe(musician).await;

        for _ in 0..3 {
            bus.publish(donation(musician)).await;
        }

        // A dashboard that re-bootstraps must not replay the backlog its
        // fresh snapshot already covers; the new handle starts at the tail.
        let mut rx = rx.resubscribe();
        bus.publish(donation(musician)).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.seq, 4);
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn channels_are_independent_across_musicians() {
        let bus = DonationEventBus::new(4);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = bus.subscribe(a).await;

        bus.publish(donation(b)).await;
        bus.publish(donation(a)).await;

        let event = rx_a.recv().await.unwrap();
        assert_eq!(event.donation.musician_id, a);
        assert_eq!(event.seq, 1);
    }
}
