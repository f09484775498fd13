//! The departure board core.
//!
//! One refresh cycle fetches every trip over two query windows
//! ([`fetch_trip`]), normalizes the records ([`normalize`]) and renders a
//! verbose and a compact view per trip ([`TripView`]). The [`Scheduler`]
//! shows the latest complete output while the next cycle runs in the
//! background, and the [`Supervisor`] restarts it after faults.

mod cycle;
mod fetch;
mod normalize;
mod output;
mod scheduler;
mod supervisor;
mod view;

pub use cycle::{BoardContext, run_cycle};
pub use fetch::{fetch_trip, next_window_start};
pub use normalize::normalize;
pub use output::{RefreshOutput, SharedOutput};
pub use scheduler::{Scheduler, SchedulerFault, SchedulerState, UNREACHABLE_PLACEHOLDER};
pub use supervisor::{Supervisor, SupervisorState};
pub use view::{ParseError, TripView};
