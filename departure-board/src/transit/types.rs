//! Transit API response DTOs.
//!
//! These map directly to the connection records of the JSON API. Fields are
//! optional because the service omits status information rather than
//! sending nulls.

use serde::{Deserialize, Serialize};

use crate::domain::{ClockTime, Delay, RawDeparture};

use super::error::FetchError;

/// One connection record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionDto {
    /// Departure time at the start station ("HH:MM").
    pub departure: String,

    /// Scheduled time label ("HH:MM").
    pub time: String,

    /// Transport mode tags.
    #[serde(default)]
    pub products: Vec<String>,

    /// Whether the service reports the connection as on time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ontime: Option<bool>,

    /// Delay information, present only for late connections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayDto>,

    /// Whether the connection is canceled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled: Option<bool>,
}

/// Delay block of a connection record.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DelayDto {
    /// Minutes late at departure.
    pub delay_departure: u32,
}

impl TryFrom<ConnectionDto> for RawDeparture {
    type Error = FetchError;

    fn try_from(dto: ConnectionDto) -> Result<Self, Self::Error> {
        let departure_time = ClockTime::parse_hhmm(&dto.departure).map_err(|e| {
            FetchError::InvalidRecord(format!("departure {:?}: {e}", dto.departure))
        })?;
        let scheduled_time = ClockTime::parse_hhmm(&dto.time)
            .map_err(|e| FetchError::InvalidRecord(format!("time {:?}: {e}", dto.time)))?;

        Ok(RawDeparture {
            departure_time,
            scheduled_time,
            products: dto.products,
            on_time: dto.ontime,
            delay: dto.delay.map(|d| Delay {
                minutes_late: d.delay_departure,
            }),
            canceled: dto.canceled,
        })
    }
}

/// Convert a list of records, failing on the first malformed one.
pub fn convert_connections(dtos: Vec<ConnectionDto>) -> Result<Vec<RawDeparture>, FetchError> {
    dtos.into_iter().map(RawDeparture::try_from).collect()
}
