//! Normalization of raw connection records.

use crate::domain::{ClockTime, DepartureStatus, NormalizedDeparture, RawDeparture};

/// Turn raw records into display-ready ones.
///
/// Status is taken by priority (on time, delay, canceled, unknown) and the
/// wait is measured from `reference` to the scheduled time, with the
/// midnight correction of [`ClockTime::wait_minutes_from`]. The output has
/// the same length and order as the input.
pub fn normalize(raw: &[RawDeparture], reference: ClockTime) -> Vec<NormalizedDeparture> {
    raw.iter()
        .map(|r| NormalizedDeparture {
            status: DepartureStatus::of(r),
            wait_minutes: r.scheduled_time.wait_minutes_from(reference),
            products: r.products.clone(),
            departure_time: r.departure_time,
            scheduled_time: r.scheduled_time,
        })
        .collect()
}
