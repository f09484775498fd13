//! The output of a refresh cycle and its shared, swappable handle.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::view::TripView;

/// Views for every configured trip, produced by one refresh cycle.
///
/// `views` is index-aligned with the trip list the cycle ran over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutput {
    /// Number of the cycle that produced this output, counted from 1.
    /// Zero means nothing has been fetched yet.
    pub cycle: u64,
    pub views: Vec<TripView>,
}

impl RefreshOutput {
    pub fn new(cycle: u64, views: Vec<TripView>) -> Self {
        Self { cycle, views }
    }

    /// Verbose text of trip `index`, if that trip exists.
    pub fn verbose(&self, index: usize) -> Option<&str> {
        self.views.get(index).map(|v| v.verbose.as_str())
    }

    /// Compact text of trip `index`, if that trip exists.
    pub fn compact(&self, index: usize) -> Option<&str> {
        self.views.get(index).map(|v| v.compact.as_str())
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// Thread-safe handle to the current refresh output.
///
/// Readers get an immutable snapshot; writers replace the whole output at
/// once, so verbose and compact texts always come from the same cycle.
#[derive(Clone, Default)]
pub struct SharedOutput {
    inner: Arc<RwLock<Arc<RefreshOutput>>>,
}

impl SharedOutput {
    pub fn new(output: RefreshOutput) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(output))),
        }
    }

    /// The current output.
    pub async fn snapshot(&self) -> Arc<RefreshOutput> {
        let guard = self.inner.read().await;
        Arc::clone(&guard)
    }

    /// Replace the current output, returning the previous one.
    pub async fn replace(&self, output: RefreshOutput) -> Arc<RefreshOutput> {
        let mut guard = self.inner.write().await;
        std::mem::replace(&mut *guard, Arc::new(output))
    }
}
