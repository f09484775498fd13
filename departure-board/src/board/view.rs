//! Rendering normalized departures into the two display projections.

use crate::display::COMPACT_COLUMNS;
use crate::domain::NormalizedDeparture;

/// Fetched data could not be turned into a view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// None of the records carried product information
    #[error("fetched {records} connections but none carried product data")]
    NoProductData { records: usize },
}

/// Verbose and compact text for one trip.
///
/// The default value, both strings empty, stands for "nothing to show".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripView {
    /// Multi-line text for the terminal display.
    pub verbose: String,
    /// Single line for the compact display, at least 16 characters.
    pub compact: String,
}

impl TripView {
    /// A view with nothing to show.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this view has nothing to show.
    pub fn is_empty(&self) -> bool {
        self.verbose.is_empty() && self.compact.is_empty()
    }

    /// Render a trip's departures.
    ///
    /// The verbose text starts with `prefix` and the comma-separated waits,
    /// followed by one `product | departure | scheduled status` line per
    /// record with products padded to a common width. The compact text
    /// describes the first record only as `product | departure | status`,
    /// padded with spaces to 16 characters; longer text is kept as is.
    ///
    /// Fails when no record carries any product, which means the fetched data
    /// was not understood.
    ///
    /// # Examples
    ///
    /// ```
    /// use departure_board::board::TripView;
    /// use departure_board::domain::{ClockTime, DepartureStatus, NormalizedDeparture};
    ///
    /// let t = ClockTime::parse_hhmm("10:04").unwrap();
    /// let departures = vec![NormalizedDeparture {
    ///     status: DepartureStatus::OnTime,
    ///     wait_minutes: 4,
    ///     products: vec!["S".to_string()],
    ///     departure_time: t,
    ///     scheduled_time: t,
    /// }];
    ///
    /// let view = TripView::render("=HBF=>", &departures).unwrap();
    /// assert_eq!(view.verbose, "=HBF=> 4\nS | 10:04 | 10:04 +0");
    /// assert_eq!(view.compact, "S | 10:04 | +0  ");
    /// ```
    pub fn render(prefix: &str, departures: &[NormalizedDeparture]) -> Result<Self, ParseError> {
        let products: Vec<String> = departures.iter().map(|d| d.product_label()).collect();

        let width = products
            .iter()
            .map(|p| p.chars().count())
            .max()
            .unwrap_or(0);

        if width == 0 {
            return Err(ParseError::NoProductData {
                records: departures.len(),
            });
        }

        let waits: Vec<String> = departures
            .iter()
            .map(|d| d.wait_minutes.to_string())
            .collect();

        let mut verbose = format!("{} {}", prefix, waits.join(","));
        for (d, product) in departures.iter().zip(&products) {
            verbose.push_str(&format!(
                "\n{:<width$} | {} | {} {}",
                product, d.departure_time, d.scheduled_time, d.status
            ));
        }

        let first = &departures[0];
        let compact = format!(
            "{:<COMPACT_COLUMNS$}",
            format!("{} | {} | {}", products[0], first.departure_time, first.status)
        );

        Ok(Self { verbose, compact })
    }
}
