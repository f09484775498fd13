//! Departure records, raw and normalized.

use std::fmt;

use super::time::ClockTime;

/// Delay information attached to a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    /// Minutes the departure runs late.
    pub minutes_late: u32,
}

/// One connection as returned by the transit service.
///
/// At most one of `on_time`, `delay` and `canceled` is expected to carry
/// information; when several do, [`DepartureStatus::of`] picks by priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeparture {
    /// Departure time at the start station.
    pub departure_time: ClockTime,
    /// Scheduled time label.
    pub scheduled_time: ClockTime,
    /// Transport mode tags (e.g. `BUS`, `S`, `ICE`).
    pub products: Vec<String>,
    /// Reported as running on time.
    pub on_time: Option<bool>,
    /// Reported delay, if any.
    pub delay: Option<Delay>,
    /// Reported as canceled.
    pub canceled: Option<bool>,
}

impl RawDeparture {
    /// A record with no status information.
    pub fn new(departure_time: ClockTime, scheduled_time: ClockTime, products: Vec<String>) -> Self {
        Self {
            departure_time,
            scheduled_time,
            products,
            on_time: None,
            delay: None,
            canceled: None,
        }
    }
}

/// Display status of a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureStatus {
    /// Rendered as `+0`.
    OnTime,
    /// Rendered as `+N`.
    Delayed(u32),
    /// Rendered as `X`.
    Canceled,
    /// Rendered as an empty string.
    Unknown,
}

impl DepartureStatus {
    /// Status of a raw record: on time, then delay, then canceled.
    pub fn of(raw: &RawDeparture) -> Self {
        if raw.on_time == Some(true) {
            DepartureStatus::OnTime
        } else if let Some(delay) = raw.delay {
            DepartureStatus::Delayed(delay.minutes_late)
        } else if raw.canceled == Some(true) {
            DepartureStatus::Canceled
        } else {
            DepartureStatus::Unknown
        }
    }
}

impl fmt::Display for DepartureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepartureStatus::OnTime => f.write_str("+0"),
            DepartureStatus::Delayed(minutes) => write!(f, "+{minutes}"),
            DepartureStatus::Canceled => f.write_str("X"),
            DepartureStatus::Unknown => Ok(()),
        }
    }
}

/// A display-ready departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDeparture {
    pub status: DepartureStatus,
    /// Minutes from the reference clock to the scheduled time, `0..1440`.
    pub wait_minutes: u32,
    pub products: Vec<String>,
    pub departure_time: ClockTime,
    pub scheduled_time: ClockTime,
}

impl NormalizedDeparture {
    /// Products joined with commas, as shown in both views.
    pub fn product_label(&self) -> String {
        self.products.join(",")
    }
}
