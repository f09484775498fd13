//! Transit connection queries.
//!
//! The board only ever asks one question of the outside world: the next
//! connections between two stations from a point in time. This module holds
//! that seam ([`ConnectionSource`]) and its implementations:
//! - [`HttpConnectionSource`] queries a JSON API over HTTP
//! - [`MockConnectionSource`] serves static timetables for development
//!
//! Times in connection records are "HH:MM" labels without a date.

mod client;
mod error;
mod mock;
mod source;
mod types;

pub use client::{HttpConnectionSource, TransitConfig};
pub use error::FetchError;
pub use mock::{MockConnectionSource, MockQuery};
pub use source::ConnectionSource;
pub use types::{ConnectionDto, DelayDto, convert_connections};
