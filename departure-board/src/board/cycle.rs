//! One refresh cycle: fetch, normalize and render every configured trip.

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime, Timelike};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::BoardConfig;
use crate::domain::{ClockTime, NormalizedDeparture, TripConfig};
use crate::store::{DepartureFact, DepartureStore, route_departure};
use crate::transit::ConnectionSource;

use super::fetch::fetch_trip;
use super::normalize::normalize;
use super::output::RefreshOutput;
use super::view::TripView;

/// Everything a refresh cycle needs, shared read-only across cycles.
pub struct BoardContext {
    pub trips: Vec<TripConfig>,
    pub source: Arc<dyn ConnectionSource>,
    pub store: Arc<dyn DepartureStore>,
    pub config: BoardConfig,
}

impl BoardContext {
    pub fn new(
        trips: Vec<TripConfig>,
        source: Arc<dyn ConnectionSource>,
        store: Arc<dyn DepartureStore>,
        config: BoardConfig,
    ) -> Self {
        Self {
            trips,
            source,
            store,
            config,
        }
    }
}

/// Run a refresh cycle over all trips at wall-clock time `clock_now`.
///
/// Connections are queried from `clock_now` plus the lookahead, while waits
/// are measured from `clock_now` itself. A trip whose fetch or render fails
/// gets an empty view; the other trips are unaffected.
pub async fn run_cycle(ctx: &BoardContext, clock_now: NaiveDateTime, cycle: u64) -> RefreshOutput {
    let query_at = clock_now + ctx.config.lookahead();
    let reference = ClockTime::from(clock_now.time());

    let views = join_all(
        ctx.trips
            .iter()
            .map(|trip| refresh_trip(ctx, trip, query_at, reference)),
    )
    .await;

    let shown = views.iter().filter(|v| !v.is_empty()).count();
    info!(cycle, trips = views.len(), shown, "refresh cycle complete");

    RefreshOutput::new(cycle, views)
}

async fn refresh_trip(
    ctx: &BoardContext,
    trip: &TripConfig,
    query_at: NaiveDateTime,
    reference: ClockTime,
) -> TripView {
    let raw = match fetch_trip(
        ctx.source.as_ref(),
        trip,
        query_at,
        ctx.config.fetch_timeout(),
    )
    .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(start = %trip.start, goal = %trip.goal, error = %e, "failed to fetch connections");
            return TripView::empty();
        }
    };

    let departures = normalize(&raw, reference);

    let view = match TripView::render(&trip.prefix, &departures) {
        Ok(view) => view,
        Err(e) => {
            warn!(start = %trip.start, goal = %trip.goal, error = %e, "failed to parse connections");
            return TripView::empty();
        }
    };

    if let Some(first) = departures.first() {
        record_departure(&ctx.store, trip, query_at, first).await;
    }

    view
}

/// Stores run on the blocking pool since sinks do synchronous I/O.
async fn record_departure(
    store: &Arc<dyn DepartureStore>,
    trip: &TripConfig,
    at: NaiveDateTime,
    departure: &NormalizedDeparture,
) {
    let fact = DepartureFact {
        year: at.year(),
        month: at.month(),
        day: at.day(),
        hour: at.hour(),
        minute: at.minute(),
        mode: departure.product_label(),
        start: trip.start.clone(),
        goal: trip.goal.clone(),
        departure_time: departure.departure_time,
        status: departure.status.to_string(),
    };

    let store = Arc::clone(store);
    let mode = fact.mode.clone();
    let stored = tokio::task::spawn_blocking(move || route_departure(store.as_ref(), &fact)).await;

    match stored {
        Ok(Ok(())) => debug!(%mode, start = %trip.start, "departure stored"),
        Ok(Err(e)) => error!(start = %trip.start, goal = %trip.goal, error = %e, "failed to store departure"),
        Err(e) => error!(start = %trip.start, goal = %trip.goal, error = %e, "store task failed"),
    }
}
