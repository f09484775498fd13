//! Domain types for the departure board.
//!
//! Time labels are validated when records enter the crate, so the board
//! logic downstream works with parsed values only.

mod departure;
mod time;
mod trip;

pub use departure::{Delay, DepartureStatus, NormalizedDeparture, RawDeparture};
pub use time::{ClockTime, MINUTES_PER_DAY, TimeError};
pub use trip::{TripConfig, default_prefix};
