// handler/dashboard.rs
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Path,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Extension, Json, Router,
};
use futures::stream::Stream;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::{
    db::musiciandb::MusicianExt,
    dtos::donationdtos::ApiResponse,
    error::{ErrorMessage, HttpError},
    service::stats_aggregator::{ApplyOutcome, DashboardStats, StatsAggregator},
    AppState,
};

pub fn dashboard_handler() -> Router {
    Router::new()
        .route("/:musician_id", get(get_stats))
        .route("/:musician_id/live", get(live_stats))
}

/// One-shot DashboardStats snapshot: a full cold bootstrap from the
/// ledger, no subscription attached.
pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(musician_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let mut aggregator = build_aggregator(&app_state, musician_id).await?;
    aggregator.bootstrap().await?;

    Ok(Json(ApiResponse::success(
        "Dashboard stats retrieved successfully",
        aggregator.snapshot(),
    )))
}

/// Subscribe handle: an SSE stream that pushes a fresh DashboardStats
/// after the bootstrap and then after every applied event. Each dashboard
/// session gets its own aggregator and its own channel; nothing here can
/// back-pressure the ledger.
pub async fn live_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(musician_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, HttpError> {
    let aggregator = build_aggregator(&app_state, musician_id).await?;

    // Attach the subscription before bootstrapping so events landing in
    // the snapshot gap are delivered and merged append-only.
    let events = app_state.event_bus.subscribe(musician_id).await;

    let (tx, rx) = mpsc::channel::<DashboardStats>(16);
    tokio::spawn(run_subscription(aggregator, events, tx));

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        let stats = rx.recv().await?;
        let event = Event::default().event("stats").json_data(&stats);
        Some((event, rx))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn build_aggregator(
    app_state: &Arc<AppState>,
    musician_id: Uuid,
) -> Result<StatsAggregator, HttpError> {
    let musician = app_state
        .db_client
        .get_musician(musician_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::MusicianNotFound.to_string()))?;

    Ok(StatsAggregator::new(
        app_state.db_client.clone(),
        musician.id,
        musician.timezone_offset_minutes,
        Duration::from_secs(app_state.env.bootstrap_timeout_secs),
    ))
}

/// Drives one dashboard session: bootstrap, then apply live events,
/// re-bootstrapping on any desync (sequence gap or lagged receiver).
/// Ends when the client goes away or the bootstrap gives up.
async fn run_subscription(
    mut aggregator: StatsAggregator,
    mut events: broadcast::Receiver<crate::service::events::DonationEvent>,
    tx: mpsc::Sender<DashboardStats>,
) {
    'session: loop {
        if let Err(e) = aggregator.bootstrap().await {
            tracing::warn!(
                "dashboard bootstrap failed for musician {}: {}",
                aggregator.musician_id(),
                e
            );
            break;
        }
        if tx.send(aggregator.snapshot()).await.is_err() {
            break;
        }

        loop {
            match events.recv().await {
                Ok(event) => match aggregator.apply(&event) {
                    ApplyOutcome::Applied => {
                        if tx.send(aggregator.snapshot()).await.is_err() {
                            break 'session;
                        }
                    }
                    ApplyOutcome::Duplicate | ApplyOutcome::Ignored => {}
                    ApplyOutcome::Desynced => {
                        // The next snapshot covers everything already in
                        // this receiver's buffer; start from the tail or
                        // the backlog would be counted twice.
                        events = events.resubscribe();
                        continue 'session;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "dashboard for musician {} lagged {} events; re-bootstrapping",
                        aggregator.musician_id(),
                        skipped
                    );
                    aggregator.disconnect();
                    events = events.resubscribe();
                    continue 'session;
                }
                Err(broadcast::error::RecvError::Closed) => break 'session,
            }
        }
    }
}
