//! Configured trips.

/// A monitored connection between two stations.
///
/// Created once at startup and shared read-only with every refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripConfig {
    /// Start station, as the transit service names it.
    pub start: String,
    /// Goal station, as the transit service names it.
    pub goal: String,
    /// Label shown in front of the verbose view (7 characters fit best).
    pub prefix: String,
    /// Only consider connections without changes.
    pub only_direct: bool,
}

impl TripConfig {
    /// Create a trip, deriving the prefix from the goal when none is given.
    ///
    /// # Examples
    ///
    /// ```
    /// use departure_board::domain::TripConfig;
    ///
    /// let trip = TripConfig::new("Pasing", "München Hbf", None, true);
    /// assert_eq!(trip.prefix, "=MÜ===>");
    ///
    /// let trip = TripConfig::new("Pasing", "München Hbf", Some("=HBF=>"), true);
    /// assert_eq!(trip.prefix, "=HBF=>");
    /// ```
    pub fn new(
        start: impl Into<String>,
        goal: impl Into<String>,
        prefix: Option<&str>,
        only_direct: bool,
    ) -> Self {
        let goal = goal.into();
        let prefix = match prefix {
            Some(p) => p.to_string(),
            None => default_prefix(&goal),
        };

        Self {
            start: start.into(),
            goal,
            prefix,
            only_direct,
        }
    }
}

/// `=XX===>` where `XX` are the first two characters of the goal, uppercased.
pub fn default_prefix(goal: &str) -> String {
    let abbreviation: String = goal.chars().take(2).collect();
    format!("={}===>", abbreviation.to_uppercase())
}
