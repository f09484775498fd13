//! The connection query seam.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::RawDeparture;

use super::error::FetchError;

/// Anything that can answer "which connections leave `start` for `goal`
/// from `at` onwards".
///
/// Implementations return records in departure order. The board holds the
/// source behind an `Arc<dyn ConnectionSource>` so that background refresh
/// tasks can share it.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    async fn connections(
        &self,
        start: &str,
        goal: &str,
        at: NaiveDateTime,
        only_direct: bool,
    ) -> Result<Vec<RawDeparture>, FetchError>;
}
