//! Mock connection source for running without a transit service.
//!
//! Serves timetables loaded from a JSON file (or added in code) as if they
//! were live API responses, paging through them by time of day.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::domain::{ClockTime, RawDeparture};

use super::error::FetchError;
use super::source::ConnectionSource;
use super::types::{ConnectionDto, convert_connections};

/// Records returned per query unless configured otherwise.
const DEFAULT_PAGE_SIZE: usize = 5;

/// Route key: (start, goal).
type RouteKey = (String, String);

/// On-disk format of the mock timetable file.
#[derive(Debug, Deserialize)]
struct MockFile {
    routes: Vec<MockRoute>,
}

#[derive(Debug, Deserialize)]
struct MockRoute {
    start: String,
    goal: String,
    connections: Vec<ConnectionDto>,
}

/// A query the mock has answered (or refused).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockQuery {
    pub start: String,
    pub goal: String,
    pub at: NaiveDateTime,
    pub only_direct: bool,
}

/// Connection source serving static timetables.
///
/// Each query returns up to `page_size` connections departing at or after
/// the queried time of day, continuing from the top of the timetable when
/// the end of the day is reached.
pub struct MockConnectionSource {
    routes: HashMap<RouteKey, Vec<RawDeparture>>,
    failing: Mutex<HashSet<RouteKey>>,
    queries: Mutex<Vec<MockQuery>>,
    page_size: usize,
}

impl MockConnectionSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            failing: Mutex::new(HashSet::new()),
            queries: Mutex::new(Vec::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Load timetables from a JSON file.
    ///
    /// Expects `{"routes": [{"start", "goal", "connections": [...]}]}` with
    /// connection records in the API's own format.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();

        let json = std::fs::read_to_string(path).map_err(|e| FetchError::Unavailable(format!(
            "failed to read {}: {e}",
            path.display()
        )))?;

        let file: MockFile = serde_json::from_str(&json).map_err(|e| FetchError::Json {
            message: format!("failed to parse {}: {e}", path.display()),
            body: None,
        })?;

        if file.routes.is_empty() {
            return Err(FetchError::Unavailable(format!(
                "no routes in {}",
                path.display()
            )));
        }

        let mut source = Self::new();
        for route in file.routes {
            let departures = convert_connections(route.connections)?;
            source = source.with_route(route.start, route.goal, departures);
        }
        Ok(source)
    }

    /// Add a timetable for a route. Departures should be in time order.
    pub fn with_route(
        mut self,
        start: impl Into<String>,
        goal: impl Into<String>,
        departures: Vec<RawDeparture>,
    ) -> Self {
        self.routes.insert((start.into(), goal.into()), departures);
        self
    }

    /// Set how many connections a single query returns.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Make queries for a route fail until it is recovered.
    #[cfg(test)]
    pub(crate) fn fail_route(&self, start: &str, goal: &str) {
        let mut failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        failing.insert((start.to_string(), goal.to_string()));
    }

    /// Let a previously failing route answer again.
    #[cfg(test)]
    pub(crate) fn recover(&self, start: &str, goal: &str) {
        let mut failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        failing.remove(&(start.to_string(), goal.to_string()));
    }

    /// All queries received so far, in order.
    pub fn queries(&self) -> Vec<MockQuery> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Routes with a timetable.
    pub fn routes(&self) -> Vec<(String, String)> {
        self.routes.keys().cloned().collect()
    }

    fn page(&self, departures: &[RawDeparture], from: ClockTime) -> Vec<RawDeparture> {
        let first = departures
            .iter()
            .position(|d| d.departure_time >= from)
            .unwrap_or(departures.len());

        departures[first..]
            .iter()
            .chain(departures[..first].iter())
            .take(self.page_size)
            .cloned()
            .collect()
    }
}

impl Default for MockConnectionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionSource for MockConnectionSource {
    async fn connections(
        &self,
        start: &str,
        goal: &str,
        at: NaiveDateTime,
        only_direct: bool,
    ) -> Result<Vec<RawDeparture>, FetchError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockQuery {
                start: start.to_string(),
                goal: goal.to_string(),
                at,
                only_direct,
            });

        let key = (start.to_string(), goal.to_string());

        if self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&key)
        {
            return Err(FetchError::Unavailable(format!("{start} -> {goal} is failing")));
        }

        let departures = self.routes.get(&key).ok_or_else(|| {
            FetchError::Unavailable(format!("no mock data for {start} -> {goal}"))
        })?;

        Ok(self.page(departures, ClockTime::from(at.time())))
    }
}
