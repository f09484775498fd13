//! Fetching connections for a trip over two consecutive query windows.
//!
//! A single query returns only a handful of connections. To show more, a
//! second query is issued starting one minute after the last departure of
//! the first, and the two results are concatenated. Departures that appear
//! in both windows are kept twice.

use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use tracing::debug;

use crate::domain::{RawDeparture, TripConfig};
use crate::transit::{ConnectionSource, FetchError};

/// Fetch connections for `trip` from `now` onwards (lookahead already
/// applied), covering two back-to-back windows.
///
/// Fails if either query fails or times out, or if the first window is
/// empty.
pub async fn fetch_trip(
    source: &dyn ConnectionSource,
    trip: &TripConfig,
    now: NaiveDateTime,
    timeout: Duration,
) -> Result<Vec<RawDeparture>, FetchError> {
    let mut departures = query(source, trip, now, timeout).await?;

    let last = departures.last().ok_or(FetchError::NoConnections)?;
    let second_start = next_window_start(now, last);

    debug!(
        start = %trip.start,
        goal = %trip.goal,
        first = departures.len(),
        %second_start,
        "querying second window"
    );

    let second = query(source, trip, second_start, timeout).await?;
    departures.extend(second);

    Ok(departures)
}

/// Start of the second window: `now` with its hour and minute replaced by
/// those of the last departure, pushed to the next day when that hour is
/// earlier than the hour of `now`, plus one minute.
///
/// Only hours are compared, so a last departure in the same hour but
/// earlier minute does not roll over.
pub fn next_window_start(now: NaiveDateTime, last: &RawDeparture) -> NaiveDateTime {
    let last_time = last.departure_time;

    let mut start = now
        .with_hour(last_time.hour())
        .and_then(|t| t.with_minute(last_time.minute()))
        .unwrap_or(now);

    if last_time.hour() < now.hour() {
        start += chrono::Duration::days(1);
    }

    start + chrono::Duration::minutes(1)
}

async fn query(
    source: &dyn ConnectionSource,
    trip: &TripConfig,
    at: NaiveDateTime,
    timeout: Duration,
) -> Result<Vec<RawDeparture>, FetchError> {
    tokio::time::timeout(
        timeout,
        source.connections(&trip.start, &trip.goal, at, trip.only_direct),
    )
    .await
    .map_err(|_| FetchError::Timeout(timeout))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClockTime;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn departure(s: &str) -> RawDeparture {
        let t = ClockTime::parse_hhmm(s).unwrap();
        RawDeparture::new(t, t, vec!["S".to_string()])
    }

    fn trip() -> TripConfig {
        TripConfig::new("München-Mittersendling", "München Hbf", None, true)
    }

    /// Answers queries from a script and records when they were asked.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<RawDeparture>, FetchError>>>,
        asked_at: Mutex<Vec<NaiveDateTime>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<RawDeparture>, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                asked_at: Mutex::new(Vec::new()),
            }
        }

        fn asked_at(&self) -> Vec<NaiveDateTime> {
            self.asked_at.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConnectionSource for ScriptedSource {
        async fn connections(
            &self,
            _start: &str,
            _goal: &str,
            at: NaiveDateTime,
            only_direct: bool,
        ) -> Result<Vec<RawDeparture>, FetchError> {
            assert!(only_direct);
            self.asked_at.lock().unwrap().push(at);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Vec::new()))
        }
    }

    /// Never answers.
    struct HangingSource;

    #[async_trait]
    impl ConnectionSource for HangingSource {
        async fn connections(
            &self,
            _start: &str,
            _goal: &str,
            _at: NaiveDateTime,
            _only_direct: bool,
        ) -> Result<Vec<RawDeparture>, FetchError> {
            std::future::pending().await
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn concatenates_both_windows() {
        let source = ScriptedSource::new(vec![
            Ok(vec![departure("10:04"), departure("10:24")]),
            Ok(vec![departure("10:44"), departure("11:04")]),
        ]);

        let result = fetch_trip(&source, &trip(), at(15, 10, 0), TIMEOUT)
            .await
            .unwrap();

        let labels: Vec<String> = result
            .iter()
            .map(|d| d.departure_time.to_string())
            .collect();
        assert_eq!(labels, vec!["10:04", "10:24", "10:44", "11:04"]);
        assert_eq!(source.asked_at(), vec![at(15, 10, 0), at(15, 10, 25)]);
    }

    #[tokio::test]
    async fn boundary_duplicates_are_kept() {
        let source = ScriptedSource::new(vec![
            Ok(vec![departure("10:04"), departure("10:24")]),
            Ok(vec![departure("10:24"), departure("10:44")]),
        ]);

        let result = fetch_trip(&source, &trip(), at(15, 10, 0), TIMEOUT)
            .await
            .unwrap();

        assert_eq!(result.len(), 4);
        assert_eq!(result[1], result[2]);
    }

    #[tokio::test]
    async fn late_departure_after_midnight_clock_stays_on_same_day() {
        // Clock says past midnight while the first window ends at 23:50.
        let source = ScriptedSource::new(vec![
            Ok(vec![departure("23:40"), departure("23:50")]),
            Ok(vec![departure("00:10")]),
        ]);

        fetch_trip(&source, &trip(), at(15, 0, 5), TIMEOUT)
            .await
            .unwrap();

        // 23 is not less than 0, so no rollover: hour comparison only.
        assert_eq!(source.asked_at()[1], at(15, 23, 51));
    }

    #[tokio::test]
    async fn last_departure_after_midnight_rolls_over() {
        let source = ScriptedSource::new(vec![
            Ok(vec![departure("23:50"), departure("00:10")]),
            Ok(vec![departure("00:30")]),
        ]);

        fetch_trip(&source, &trip(), at(15, 23, 45), TIMEOUT)
            .await
            .unwrap();

        assert_eq!(source.asked_at(), vec![at(15, 23, 45), at(16, 0, 11)]);
    }

    #[test]
    fn same_hour_earlier_minute_does_not_roll_over() {
        let start = next_window_start(at(15, 10, 30), &departure("10:10"));
        assert_eq!(start, at(15, 10, 11));
    }

    #[test]
    fn keeps_seconds_of_now() {
        let now = at(15, 10, 0) + chrono::Duration::seconds(42);
        let start = next_window_start(now, &departure("10:24"));
        assert_eq!(start, at(15, 10, 25) + chrono::Duration::seconds(42));
    }

    #[test]
    fn rollover_crosses_month_end() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let start = next_window_start(now, &departure("01:15"));
        assert_eq!(
            start,
            NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(1, 16, 0)
                .unwrap()
        );
    }

    #[tokio::test]
    async fn empty_first_window_fails() {
        let source = ScriptedSource::new(vec![Ok(Vec::new())]);

        let result = fetch_trip(&source, &trip(), at(15, 10, 0), TIMEOUT).await;

        assert!(matches!(result, Err(FetchError::NoConnections)));
        assert_eq!(source.asked_at().len(), 1);
    }

    #[tokio::test]
    async fn empty_second_window_is_fine() {
        let source = ScriptedSource::new(vec![Ok(vec![departure("10:04")]), Ok(Vec::new())]);

        let result = fetch_trip(&source, &trip(), at(15, 10, 0), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn second_window_failure_aborts() {
        let source = ScriptedSource::new(vec![
            Ok(vec![departure("10:04")]),
            Err(FetchError::RateLimited),
        ]);

        let result = fetch_trip(&source, &trip(), at(15, 10, 0), TIMEOUT).await;
        assert!(matches!(result, Err(FetchError::RateLimited)));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_query_times_out() {
        let result = fetch_trip(&HangingSource, &trip(), at(15, 10, 0), TIMEOUT).await;
        assert!(matches!(result, Err(FetchError::Timeout(d)) if d == TIMEOUT));
    }
}
