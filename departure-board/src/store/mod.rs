//! Persistence of observed departures.
//!
//! After each successful refresh the first departure of a trip is recorded,
//! routed by transport mode: bus departures and rail (`S`) departures go to
//! separate sinks. Any other mode cannot be stored.

mod jsonl;

pub use jsonl::JsonLinesStore;

use serde::Serialize;

use crate::domain::ClockTime;

/// Mode tag of bus departures.
pub const BUS_MODE: &str = "BUS";

/// Mode tag of suburban rail departures.
pub const RAIL_MODE: &str = "S";

/// One observed departure, timestamped with the query instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartureFact {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    /// Transport mode label (products joined by commas).
    pub mode: String,
    pub start: String,
    pub goal: String,
    pub departure_time: ClockTime,
    /// Rendered status (`+0`, `+N`, `X` or empty).
    pub status: String,
}

/// The transport mode could not be mapped to a sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not identify transport mode {mode:?}")]
pub struct StoreRoutingError {
    pub mode: String,
}

/// Errors from storing departures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No sink for this transport mode
    #[error(transparent)]
    Routing(#[from] StoreRoutingError),

    /// Writing to the sink failed
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the record failed
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage sinks for observed departures.
pub trait DepartureStore: Send + Sync {
    fn store_bus_departure(&self, fact: &DepartureFact) -> Result<(), StoreError>;

    fn store_rail_departure(&self, fact: &DepartureFact) -> Result<(), StoreError>;
}

/// Store a departure in the sink matching its mode.
pub fn route_departure(store: &dyn DepartureStore, fact: &DepartureFact) -> Result<(), StoreError> {
    match fact.mode.as_str() {
        BUS_MODE => store.store_bus_departure(fact),
        RAIL_MODE => store.store_rail_departure(fact),
        other => Err(StoreRoutingError {
            mode: other.to_string(),
        }
        .into()),
    }
}
