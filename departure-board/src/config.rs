//! Board configuration: timings and the list of monitored trips.

use std::time::Duration;

use crate::domain::TripConfig;

/// Default dwell period in seconds.
pub const DEFAULT_REFRESH_SECS: u64 = 45;

/// Default lookahead in minutes, so that departures too close to walk to the
/// station are skipped.
pub const DEFAULT_LOOKAHEAD_MINS: i64 = 3;

/// Default bound on a single connection query.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Errors in startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Trips are given as (start, goal, prefix, only_direct) quadruples
    #[error("trip arguments must come in groups of 4 (start, goal, prefix, only_direct), got {0}")]
    TripArgumentCount(usize),

    /// An environment value could not be parsed
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Timing parameters of the board.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Length of one dwell period (seconds).
    pub refresh_secs: u64,

    /// How far ahead of the clock to query (minutes).
    pub lookahead_mins: i64,

    /// Bound on each connection query (seconds).
    pub fetch_timeout_secs: u64,

    /// Ticks per dwell period.
    pub dwell_ticks: u32,

    /// The highlighted trip advances every this many ticks.
    pub rotate_every: u32,

    /// Ticks in the error cooldown before a restart.
    pub cooldown_ticks: u32,

    /// Length of one cooldown tick (milliseconds).
    pub cooldown_tick_millis: u64,
}

impl BoardConfig {
    /// Override timings from environment variables via `lookup`.
    ///
    /// Reads `BOARD_REFRESH_SECS`, `BOARD_LOOKAHEAD_MINS` and
    /// `BOARD_FETCH_TIMEOUT_SECS`; unset variables keep their defaults. The
    /// refresh period and fetch timeout must be positive.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("BOARD_REFRESH_SECS") {
            config.refresh_secs = parse_positive("BOARD_REFRESH_SECS", &v)?;
        }
        if let Some(v) = lookup("BOARD_LOOKAHEAD_MINS") {
            config.lookahead_mins = parse_value("BOARD_LOOKAHEAD_MINS", &v)?;
        }
        if let Some(v) = lookup("BOARD_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout_secs = parse_positive("BOARD_FETCH_TIMEOUT_SECS", &v)?;
        }

        Ok(config)
    }

    /// Override timings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Set the dwell period.
    pub fn with_refresh_secs(mut self, secs: u64) -> Self {
        self.refresh_secs = secs;
        self
    }

    /// Set the lookahead.
    pub fn with_lookahead_mins(mut self, mins: i64) -> Self {
        self.lookahead_mins = mins;
        self
    }

    /// Set the query timeout.
    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    /// Returns the dwell period as a Duration.
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Returns the sleep between two dwell ticks.
    pub fn tick(&self) -> Duration {
        self.refresh() / self.dwell_ticks.max(1)
    }

    /// Returns the lookahead as a chrono Duration.
    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.lookahead_mins)
    }

    /// Returns the query timeout as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Returns the length of one cooldown tick.
    pub fn cooldown_tick(&self) -> Duration {
        Duration::from_millis(self.cooldown_tick_millis)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            refresh_secs: DEFAULT_REFRESH_SECS,
            lookahead_mins: DEFAULT_LOOKAHEAD_MINS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            dwell_ticks: 30,
            rotate_every: 5,
            cooldown_ticks: 60,
            cooldown_tick_millis: 2400, // 60s / 25
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match parse_value(key, value)? {
        0 => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
        n => Ok(n),
    }
}

/// Trips monitored when none are given on the command line.
pub fn default_trips() -> Vec<TripConfig> {
    vec![
        TripConfig::new("München-Mittersendling", "München Hbf", Some("=HBF=>"), true),
        TripConfig::new(
            "Steinerstraße, München",
            "Am Harras, München",
            Some("=HARR=>"),
            true,
        ),
    ]
}

/// Parse trips from process arguments.
///
/// Arguments come in quadruples `start goal prefix only_direct`; an empty
/// prefix falls back to the default prefix and `only_direct` is true only
/// for `true` in any letter case. With no arguments the default trips are used.
///
/// # Examples
///
/// ```
/// use departure_board::config::parse_trip_args;
///
/// let args = ["Stuttgart Hbf", "Karlsruhe Hbf", "==KA==>", "True"];
/// let trips = parse_trip_args(&args).unwrap();
/// assert_eq!(trips[0].prefix, "==KA==>");
/// assert!(trips[0].only_direct);
///
/// assert!(parse_trip_args(&["Stuttgart Hbf", "Karlsruhe Hbf"]).is_err());
/// ```
pub fn parse_trip_args<S: AsRef<str>>(args: &[S]) -> Result<Vec<TripConfig>, ConfigError> {
    if args.is_empty() {
        return Ok(default_trips());
    }

    if args.len() % 4 != 0 {
        return Err(ConfigError::TripArgumentCount(args.len()));
    }

    Ok(args
        .chunks_exact(4)
        .map(|quad| {
            let prefix = quad[2].as_ref();
            TripConfig::new(
                quad[0].as_ref(),
                quad[1].as_ref(),
                (!prefix.is_empty()).then_some(prefix),
                quad[3].as_ref().eq_ignore_ascii_case("true"),
            )
        })
        .collect())
}
