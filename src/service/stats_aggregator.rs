// service/stats_aggregator.rs
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{db::DBClient, donationdb::DonationExt},
    models::donationmodel::Donation,
    service::{error::ServiceError, events::DonationEvent},
};

pub const RECENT_DONATIONS_CAP: usize = 10;
pub const CHART_DAYS: usize = 7;
/// Ring of recently-seen donation ids kept for at-least-once dedup. Sized
/// well above the redelivery window a lagging broadcast receiver can see.
const SEEN_IDS_CAP: usize = 64;
const BOOTSTRAP_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Disconnected,
    Syncing,
    Live,
}

/// What `apply` did with an event. `Desynced` means a sequence gap was
/// detected and the caller must re-bootstrap before applying anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Duplicate,
    Ignored,
    Desynced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartBucket {
    pub date: NaiveDate,
    pub earnings: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationSummary {
    pub id: Uuid,
    pub fan_id: Option<Uuid>,
    pub amount: i64,
    pub artist_payout: i64,
    pub message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Donation> for DonationSummary {
    fn from(donation: &Donation) -> Self {
        DonationSummary {
            id: donation.id,
            fan_id: donation.fan_id,
            amount: donation.amount,
            artist_payout: donation.artist_payout,
            message: donation.message.clone(),
            created_at: donation.created_at,
        }
    }
}

/// Per-musician rolling dashboard view. Derived state only: always
/// reconstructible from the donation ledger by re-bootstrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today_earnings: i64,
    pub monthly_earnings: i64,
    pub unique_fan_count: i64,
    pub recent_donations: Vec<DonationSummary>,
    pub chart: Vec<ChartBucket>,
}

/// Result of the cold-start ledger reads, installed atomically into the
/// aggregator once all queries finished.
#[derive(Debug, Clone)]
pub struct BootstrapSnapshot {
    pub today_earnings: i64,
    pub monthly_earnings: i64,
    pub fan_ids: Vec<Uuid>,
    pub recent: Vec<Donation>,
    pub chart: Vec<ChartBucket>,
}

#[derive(Debug, Default)]
struct SeenRing {
    order: VecDeque<Uuid>,
    set: HashSet<Uuid>,
}

impl SeenRing {
    /// Returns false when the id was already seen. Oldest entries are
    /// evicted past capacity; an id older than the ring window would be
    /// re-applied, which FIFO-per-musician delivery rules out.
    fn insert(&mut self, id: Uuid) -> bool {
        if !self.set.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > SEEN_IDS_CAP {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
            }
        }
        true
    }
}

/// One dashboard subscription's view of a musician's earnings, kept
/// consistent against an at-least-once, FIFO-per-musician event stream.
///
/// All mutation goes through `apply` (and the window roll it performs);
/// nothing else touches the stats fields, which is what keeps the dedup
/// and rollover invariants enforced in one place.
#[derive(Debug)]
pub struct StatsAggregator {
    db_client: Arc<DBClient>,
    musician_id: Uuid,
    tz: FixedOffset,
    state: SubscriptionState,
    stats: DashboardStats,
    seen_ids: SeenRing,
    seen_fans: HashSet<Uuid>,
    last_seq: Option<u64>,
    current_day: NaiveDate,
    current_month: (i32, u32),
    bootstrap_timeout: Duration,
}

fn local_day_start_utc(date: NaiveDate, tz: &FixedOffset) -> DateTime<Utc> {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc_naive = local_midnight - ChronoDuration::seconds(tz.local_minus_utc() as i64);
    DateTime::<Utc>::from_naive_utc_and_offset(utc_naive, Utc)
}

fn empty_chart(local_today: NaiveDate) -> Vec<ChartBucket> {
    (0..CHART_DAYS as i64)
        .rev()
        .map(|back| ChartBucket {
            date: local_today - ChronoDuration::days(back),
            earnings: 0,
        })
        .collect()
}

impl StatsAggregator {
    pub fn new(
        db_client: Arc<DBClient>,
        musician_id: Uuid,
        timezone_offset_minutes: i32,
        bootstrap_timeout: Duration,
    ) -> Self {
        let tz = FixedOffset::east_opt(timezone_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        let local_today = Utc::now().with_timezone(&tz).date_naive();
        StatsAggregator {
            db_client,
            musician_id,
            tz,
            state: SubscriptionState::Disconnected,
            stats: DashboardStats {
                today_earnings: 0,
                monthly_earnings: 0,
                unique_fan_count: 0,
                recent_donations: Vec::new(),
                chart: empty_chart(local_today),
            },
            seen_ids: SeenRing::default(),
            seen_fans: HashSet::new(),
            last_seq: None,
            current_day: local_today,
            current_month: (local_today.year(), local_today.month()),
            bootstrap_timeout,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn musician_id(&self) -> Uuid {
        self.musician_id
    }

    /// Transport loss: drop back to Disconnected. The next bootstrap picks
    /// up whatever was missed; resuming blindly is never correct.
    pub fn disconnect(&mut self) {
        self.state = SubscriptionState::Disconnected;
        self.last_seq = None;
    }

    /// Cold start: read today/month totals, the distinct fan set, the last
    /// ten donations and one query per trailing chart day, then go Live.
    /// Each attempt runs under its own timeout; expiry retries the whole
    /// bootstrap instead of serving a Disconnected dashboard as Live.
    pub async fn bootstrap(&mut self) -> Result<(), ServiceError> {
        self.state = SubscriptionState::Syncing;

        let mut attempt = 0;
        let snapshot = loop {
            attempt += 1;
            let attempt_result =
                tokio::time::timeout(self.bootstrap_timeout, self.load_snapshot(Utc::now())).await;
            match attempt_result {
                Ok(Ok(snapshot)) => break snapshot,
                Ok(Err(e)) => {
                    self.state = SubscriptionState::Disconnected;
                    return Err(e);
                }
                Err(_elapsed) if attempt < BOOTSTRAP_ATTEMPTS => {
                    tracing::warn!(
                        "stats bootstrap attempt {} timed out for musician {}; retrying",
                        attempt,
                        self.musician_id
                    );
                }
                Err(_elapsed) => {
                    self.state = SubscriptionState::Disconnected;
                    return Err(ServiceError::BootstrapTimeout(
                        self.bootstrap_timeout.as_secs(),
                    ));
                }
            }
        };

        self.install_snapshot(snapshot, Utc::now());
        Ok(())
    }

    async fn load_snapshot(&self, now: DateTime<Utc>) -> Result<BootstrapSnapshot, ServiceError> {
        let local_today = now.with_timezone(&self.tz).date_naive();
        let today_start = local_day_start_utc(local_today, &self.tz);
        let tomorrow_start =
            local_day_start_utc(local_today + ChronoDuration::days(1), &self.tz);
        let month_start_date = local_today.with_day(1).unwrap_or(local_today);
        let month_start = local_day_start_utc(month_start_date, &self.tz);

        let today_earnings = self
            .db_client
            .earnings_between(self.musician_id, today_start, tomorrow_start)
            .await?;
        let monthly_earnings = self
            .db_client
            .earnings_between(self.musician_id, month_start, tomorrow_start)
            .await?;
        let fan_ids = self.db_client.distinct_fan_ids(self.musician_id).await?;
        let recent = self
            .db_client
            .recent_completed_donations(self.musician_id, RECENT_DONATIONS_CAP as i64)
            .await?;

        let mut chart = Vec::with_capacity(CHART_DAYS);
        for back in (0..CHART_DAYS as i64).rev() {
            let date = local_today - ChronoDuration::days(back);
            let from = local_day_start_utc(date, &self.tz);
            let to = local_day_start_utc(date + ChronoDuration::days(1), &self.tz);
            let earnings = self
                .db_client
                .earnings_between(self.musician_id, from, to)
                .await?;
            chart.push(ChartBucket { date, earnings });
        }

        Ok(BootstrapSnapshot {
            today_earnings,
            monthly_earnings,
            fan_ids,
            recent,
            chart,
        })
    }

    /// Swap the snapshot in and go Live. Seeds the dedup ring with the
    /// bootstrapped donation ids so events from the gap between "snapshot
    /// taken" and "subscription attached" merge append-only: a pre-snapshot
    /// event whose id was bootstrapped is a duplicate, one that was not is
    /// still applied.
    pub fn install_snapshot(&mut self, snapshot: BootstrapSnapshot, now: DateTime<Utc>) {
        let local_today = now.with_timezone(&self.tz).date_naive();

        self.seen_ids = SeenRing::default();
        for donation in &snapshot.recent {
            self.seen_ids.insert(donation.id);
        }
        self.seen_fans = snapshot.fan_ids.iter().copied().collect();

        self.stats = DashboardStats {
            today_earnings: snapshot.today_earnings,
            monthly_earnings: snapshot.monthly_earnings,
            unique_fan_count: self.seen_fans.len() as i64,
            recent_donations: snapshot.recent.iter().map(DonationSummary::from).collect(),
            chart: snapshot.chart,
        };
        self.current_day = local_today;
        self.current_month = (local_today.year(), local_today.month());
        self.last_seq = None;
        self.state = SubscriptionState::Live;
    }

    /// Apply one stream event. Deduplicates by donation id, checks the
    /// event's calendar day against each bucket independently and updates
    /// every affected field or none. Safe to call with redelivered events.
    pub fn apply(&mut self, event: &DonationEvent) -> ApplyOutcome {
        self.apply_at(event, Utc::now())
    }

    pub fn apply_at(&mut self, event: &DonationEvent, now: DateTime<Utc>) -> ApplyOutcome {
        if self.state != SubscriptionState::Live {
            return ApplyOutcome::Ignored;
        }

        // A hole in the per-musician sequence means missed events; the
        // window and totals can no longer be trusted incrementally.
        if let Some(last) = self.last_seq {
            if event.seq > last + 1 {
                tracing::warn!(
                    "event gap for musician {} (seq {} after {}); re-bootstrap required",
                    self.musician_id,
                    event.seq,
                    last
                );
                self.disconnect();
                return ApplyOutcome::Desynced;
            }
            if event.seq <= last {
                return ApplyOutcome::Duplicate;
            }
        }
        self.last_seq = Some(event.seq);

        self.roll_window(now);

        let donation = &event.donation;
        if !donation.is_completed() {
            return ApplyOutcome::Ignored;
        }
        if !self.seen_ids.insert(donation.id) {
            return ApplyOutcome::Duplicate;
        }

        let event_date = donation
            .created_at
            .unwrap_or(now)
            .with_timezone(&self.tz)
            .date_naive();

        // Each bucket decides independently whether the event's date falls
        // inside it; a stale-day event must not leak into today.
        if event_date == self.current_day {
            self.stats.today_earnings += donation.artist_payout;
        }
        if (event_date.year(), event_date.month()) == self.current_month {
            self.stats.monthly_earnings += donation.artist_payout;
        }
        if let Some(bucket) = self
            .stats
            .chart
            .iter_mut()
            .find(|bucket| bucket.date == event_date)
        {
            bucket.earnings += donation.artist_payout;
        }

        self.stats
            .recent_donations
            .insert(0, DonationSummary::from(donation));
        self.stats.recent_donations.truncate(RECENT_DONATIONS_CAP);

        if let Some(fan_id) = donation.fan_id {
            if self.seen_fans.insert(fan_id) {
                self.stats.unique_fan_count += 1;
            }
        }

        ApplyOutcome::Applied
    }

    /// Slide the calendar window past any local midnights that elapsed,
    /// independent of event arrival: evict aged buckets, append empty ones,
    /// and reset the day/month totals that no longer apply.
    fn roll_window(&mut self, now: DateTime<Utc>) {
        let local_today = now.with_timezone(&self.tz).date_naive();
        if local_today == self.current_day {
            return;
        }

        while self.current_day < local_today {
            self.current_day = self.current_day + ChronoDuration::days(1);
            self.stats.chart.push(ChartBucket {
                date: self.current_day,
                earnings: 0,
            });
        }
        let excess = self.stats.chart.len().saturating_sub(CHART_DAYS);
        self.stats.chart.drain(..excess);

        self.stats.today_earnings = 0;
        let month = (local_today.year(), local_today.month());
        if month != self.current_month {
            self.current_month = month;
            self.stats.monthly_earnings = 0;
        }
    }

    /// Current view, with the day window rolled forward first so a quiet
    /// dashboard still ticks past midnight.
    pub fn snapshot(&mut self) -> DashboardStats {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&mut self, now: DateTime<Utc>) -> DashboardStats {
        self.roll_window(now);
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::donationmodel::DonationStatus;
    use chrono::TimeZone;
    use sqlx::postgres::PgPoolOptions;

    fn test_aggregator(offset_minutes: i32) -> StatsAggregator {
        let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/encore").unwrap();
        StatsAggregator::new(
            Arc::new(DBClient::new(pool)),
            Uuid::new_v4(),
            offset_minutes,
            Duration::from_secs(5),
        )
    }

    fn empty_snapshot(now: DateTime<Utc>, tz: FixedOffset) -> BootstrapSnapshot {
        let local_today = now.with_timezone(&tz).date_naive();
        BootstrapSnapshot {
            today_earnings: 0,
            monthly_earnings: 0,
            fan_ids: Vec::new(),
            recent: Vec::new(),
            chart: empty_chart(local_today),
        }
    }

    fn donation_at(
        musician_id: Uuid,
        fan_id: Option<Uuid>,
        payout: i64,
        created_at: DateTime<Utc>,
    ) -> Donation {
        Donation {
            id: Uuid::new_v4(),
            musician_id,
            fan_id,
            show_id: None,
            song_id: None,
            amount: payout + payout / 9,
            message: None,
            status: DonationStatus::Completed,
            transaction_id: Some("tx".to_string()),
            artist_payout: payout,
            platform_fee: payout / 9,
            affiliate_tier1_id: None,
            affiliate_tier1_fee: 0,
            affiliate_tier2_id: None,
            affiliate_tier2_fee: 0,
            created_at: Some(created_at),
        }
    }

    fn live_aggregator(now: DateTime<Utc>) -> StatsAggregator {
        let mut agg = test_aggregator(0);
        let snapshot = empty_snapshot(now, FixedOffset::east_opt(0).unwrap());
        agg.install_snapshot(snapshot, now);
        agg
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[tokio::test]
    async fn replayed_event_counts_exactly_once() {
        let now = utc(2025, 6, 10, 15, 0);
        let mut agg = live_aggregator(now);
        let donation = donation_at(agg.musician_id(), None, 900, now);
        let event = DonationEvent { seq: 1, donation };

        assert_eq!(agg.apply_at(&event, now), ApplyOutcome::Applied);
        assert_eq!(agg.apply_at(&event, now), ApplyOutcome::Duplicate);
        assert_eq!(agg.snapshot_at(now).today_earnings, 900);
    }

    #[tokio::test]
    async fn stale_day_event_skips_today_but_lands_in_chart() {
        // Bootstrapped before midnight; an event dated yesterday arrives
        // just after the boundary.
        let before_midnight = utc(2025, 6, 10, 23, 50);
        let mut agg = live_aggregator(before_midnight);

        let after_midnight = utc(2025, 6, 11, 0, 5);
        let stale = donation_at(
            agg.musician_id(),
            None,
            500,
            utc(2025, 6, 10, 23, 55),
        );
        let event = DonationEvent { seq: 1, donation: stale };
        assert_eq!(agg.apply_at(&event, after_midnight), ApplyOutcome::Applied);

        let stats = agg.snapshot_at(after_midnight);
        assert_eq!(stats.today_earnings, 0);
        assert_eq!(stats.monthly_earnings, 500);
        let yesterday = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let bucket = stats.chart.iter().find(|b| b.date == yesterday).unwrap();
        assert_eq!(bucket.earnings, 500);
        let today = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        assert_eq!(stats.chart.last().unwrap().date, today);
    }

    #[tokio::test]
    async fn event_older_than_window_is_dropped_from_chart() {
        let now = utc(2025, 6, 10, 12, 0);
        let mut agg = live_aggregator(now);
        let ancient = donation_at(agg.musician_id(), None, 700, utc(2025, 5, 1, 12, 0));
        let event = DonationEvent { seq: 1, donation: ancient };

        assert_eq!(agg.apply_at(&event, now), ApplyOutcome::Applied);
        let stats = agg.snapshot_at(now);
        assert_eq!(stats.today_earnings, 0);
        assert_eq!(stats.monthly_earnings, 0);
        assert!(stats.chart.iter().all(|b| b.earnings == 0));
        // Still visible in the recent list; only the buckets ignore it.
        assert_eq!(stats.recent_donations.len(), 1);
    }

    #[tokio::test]
    async fn two_donations_from_one_fan_in_a_day() {
        let now = utc(2025, 6, 10, 14, 0);
        let mut agg = live_aggregator(now);
        let fan = Uuid::new_v4();

        let first = donation_at(agg.musician_id(), Some(fan), 2160, now);
        let later = utc(2025, 6, 10, 18, 0);
        let second = donation_at(agg.musician_id(), Some(fan), 2160, later);
        let second_id = second.id;

        agg.apply_at(&DonationEvent { seq: 1, donation: first }, now);
        agg.apply_at(&DonationEvent { seq: 2, donation: second }, later);

        let stats = agg.snapshot_at(later);
        assert_eq!(stats.today_earnings, 4320);
        assert_eq!(stats.unique_fan_count, 1);
        assert_eq!(stats.recent_donations.len(), 2);
        assert_eq!(stats.recent_donations[0].id, second_id);
    }

    #[tokio::test]
    async fn recent_donations_cap_at_ten_most_recent_first() {
        let now = utc(2025, 6, 10, 9, 0);
        let mut agg = live_aggregator(now);
        let mut last_id = None;
        for seq in 1..=12u64 {
            let donation = donation_at(agg.musician_id(), None, 100, now);
            last_id = Some(donation.id);
            agg.apply_at(&DonationEvent { seq, donation }, now);
        }
        let stats = agg.snapshot_at(now);
        assert_eq!(stats.recent_donations.len(), RECENT_DONATIONS_CAP);
        assert_eq!(stats.recent_donations[0].id, last_id.unwrap());
        assert_eq!(stats.today_earnings, 1200);
    }

    #[tokio::test]
    async fn failed_event_advances_sequence_but_changes_nothing() {
        let now = utc(2025, 6, 10, 9, 0);
        let mut agg = live_aggregator(now);
        let mut failed = donation_at(agg.musician_id(), Some(Uuid::new_v4()), 0, now);
        failed.status = DonationStatus::Failed;
        failed.artist_payout = 0;

        assert_eq!(
            agg.apply_at(&DonationEvent { seq: 1, donation: failed }, now),
            ApplyOutcome::Ignored
        );
        let ok = donation_at(agg.musician_id(), None, 300, now);
        assert_eq!(
            agg.apply_at(&DonationEvent { seq: 2, donation: ok }, now),
            ApplyOutcome::Applied
        );
        let stats = agg.snapshot_at(now);
        assert_eq!(stats.today_earnings, 300);
        assert_eq!(stats.unique_fan_count, 0);
    }

    #[tokio::test]
    async fn sequence_gap_degrades_to_disconnected() {
        let now = utc(2025, 6, 10, 9, 0);
        let mut agg = live_aggregator(now);
        let first = donation_at(agg.musician_id(), None, 100, now);
        agg.apply_at(&DonationEvent { seq: 1, donation: first }, now);

        let skipped = donation_at(agg.musician_id(), None, 100, now);
        assert_eq!(
            agg.apply_at(&DonationEvent { seq: 3, donation: skipped }, now),
            ApplyOutcome::Desynced
        );
        assert_eq!(agg.state(), SubscriptionState::Disconnected);

        // Nothing further applies until a re-bootstrap.
        let more = donation_at(agg.musician_id(), None, 100, now);
        assert_eq!(
            agg.apply_at(&DonationEvent { seq: 4, donation: more }, now),
            ApplyOutcome::Ignored
        );
        assert_eq!(agg.snapshot_at(now).today_earnings, 100);
    }

    #[tokio::test]
    async fn quiet_dashboard_still_rolls_past_midnight() {
        let now = utc(2025, 6, 10, 22, 0);
        let mut agg = live_aggregator(now);
        let donation = donation_at(agg.musician_id(), None, 800, now);
        agg.apply_at(&DonationEvent { seq: 1, donation }, now);
        assert_eq!(agg.snapshot_at(now).today_earnings, 800);

        // Two midnights pass with no events at all.
        let later = utc(2025, 6, 12, 1, 0);
        let stats = agg.snapshot_at(later);
        assert_eq!(stats.today_earnings, 0);
        assert_eq!(stats.chart.len(), CHART_DAYS);
        let new_today = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(stats.chart.last().unwrap().date, new_today);
        let june_10 = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let bucket = stats.chart.iter().find(|b| b.date == june_10).unwrap();
        assert_eq!(bucket.earnings, 800);
        // Same month, so the monthly total survives the day rollover.
        assert_eq!(stats.monthly_earnings, 800);
    }

    #[tokio::test]
    async fn month_rollover_resets_monthly_earnings() {
        let now = utc(2025, 6, 30, 12, 0);
        let mut agg = live_aggregator(now);
        let donation = donation_at(agg.musician_id(), None, 900, now);
        agg.apply_at(&DonationEvent { seq: 1, donation }, now);

        let july = utc(2025, 7, 1, 0, 10);
        let stats = agg.snapshot_at(july);
        assert_eq!(stats.monthly_earnings, 0);
        assert_eq!(stats.today_earnings, 0);
    }

    #[tokio::test]
    async fn day_boundary_follows_display_timezone() {
        // UTC+10: at 20:00 UTC on June 10 it is already June 11 locally.
        let now = utc(2025, 6, 10, 20, 0);
        let mut agg = test_aggregator(600);
        let tz = FixedOffset::east_opt(600 * 60).unwrap();
        agg.install_snapshot(empty_snapshot(now, tz), now);

        let donation = donation_at(agg.musician_id(), None, 400, now);
        agg.apply_at(&DonationEvent { seq: 1, donation }, now);

        let stats = agg.snapshot_at(now);
        assert_eq!(stats.today_earnings, 400);
        let local_june_11 = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        assert_eq!(stats.chart.last().unwrap().date, local_june_11);
        assert_eq!(stats.chart.last().unwrap().earnings, 400);
    }

    #[tokio::test]
    async fn bootstrap_snapshot_seeds_dedup_and_fan_set() {
        let now = utc(2025, 6, 10, 12, 0);
        let mut agg = test_aggregator(0);
        let fan = Uuid::new_v4();
        let bootstrapped = donation_at(agg.musician_id(), Some(fan), 650, now);
        let bootstrapped_id = bootstrapped.id;

        let tz = FixedOffset::east_opt(0).unwrap();
        let mut snapshot = empty_snapshot(now, tz);
        snapshot.today_earnings = 650;
        snapshot.monthly_earnings = 650;
        snapshot.fan_ids = vec![fan];
        snapshot.recent = vec![bootstrapped.clone()];
        agg.install_snapshot(snapshot, now);
        assert_eq!(agg.state(), SubscriptionState::Live);

        // The same donation redelivered over the stream must not re-count,
        // and the bootstrapped fan is already unique.
        let replay = DonationEvent { seq: 5, donation: bootstrapped };
        assert_eq!(agg.apply_at(&replay, now), ApplyOutcome::Duplicate);

        let mut fresh = donation_at(agg.musician_id(), Some(fan), 100, now);
        fresh.id = Uuid::new_v4();
        agg.apply_at(&DonationEvent { seq: 6, donation: fresh }, now);

        let stats = agg.snapshot_at(now);
        assert_eq!(stats.today_earnings, 750);
        assert_eq!(stats.unique_fan_count, 1);
        assert_eq!(stats.recent_donations.len(), 2);
        assert_ne!(stats.recent_donations[0].id, bootstrapped_id);
    }
}
