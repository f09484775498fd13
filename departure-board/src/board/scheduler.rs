//! The scheduler: show the current output while the next one is fetched.
//!
//! After one blocking refresh at startup, the scheduler repeats a dwell
//! period of fixed ticks. A refresh cycle runs as a background task; when it
//! has finished by the start of a dwell period its output replaces the
//! current one as a whole.

use std::convert::Infallible;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::display::{DisplayError, Displays};

use super::cycle::{BoardContext, run_cycle};
use super::output::{RefreshOutput, SharedOutput};

/// Shown on the compact display when no trip has anything to show.
pub const UNREACHABLE_PLACEHOLDER: &str = "API unreachable";

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Running the first, blocking refresh cycle.
    Initializing,
    /// Alternating dwell periods with background refresh cycles.
    Cycling,
}

/// A failure the scheduler cannot contain.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerFault {
    /// A display rejected a write
    #[error("display failure: {0}")]
    Display(#[from] DisplayError),

    /// A refresh task panicked or was cancelled
    #[error("refresh cycle aborted: {0}")]
    CycleAborted(String),
}

/// Drives refresh cycles and the displays.
pub struct Scheduler {
    ctx: Arc<BoardContext>,
    displays: Displays,
    output: SharedOutput,
    state: SchedulerState,
    cycles: u64,
    rotation: usize,
    pending: Option<JoinHandle<RefreshOutput>>,
}

impl Scheduler {
    pub fn new(ctx: Arc<BoardContext>, displays: Displays) -> Self {
        Self {
            ctx,
            displays,
            output: SharedOutput::default(),
            state: SchedulerState::Initializing,
            cycles: 0,
            rotation: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of refresh cycles started so far.
    pub fn cycles_started(&self) -> u64 {
        self.cycles
    }

    /// Handle to the current output, for readers outside the scheduler.
    pub fn output_handle(&self) -> SharedOutput {
        self.output.clone()
    }

    /// Run the first refresh cycle to completion and publish its output.
    pub async fn initialize(&mut self) -> Result<(), SchedulerFault> {
        self.state = SchedulerState::Initializing;

        let handle = self.spawn_cycle();
        let output = join_cycle(handle).await?;
        self.output.replace(output).await;

        self.state = SchedulerState::Cycling;
        Ok(())
    }

    /// One dwell period.
    ///
    /// Publishes the background cycle if it has finished, starts a new one
    /// if none is running, then shows the current output for the configured
    /// number of ticks.
    pub async fn dwell(&mut self) -> Result<(), SchedulerFault> {
        if let Some(handle) = self.pending.take_if(|h| h.is_finished()) {
            let output = join_cycle(handle).await?;
            let cycle = output.cycle;
            self.output.replace(output).await;
            debug!(cycle, "published refresh output");
        }

        if self.pending.is_none() {
            self.pending = Some(self.spawn_cycle());
        }

        let snapshot = self.output.snapshot().await;
        self.show_compact(&snapshot)?;

        let config = &self.ctx.config;
        let rotate_every = config.rotate_every.max(1);
        let tick = config.tick();

        for i in 0..config.dwell_ticks {
            if !snapshot.is_empty() && i % rotate_every == 0 {
                self.rotation = (self.rotation + 1) % snapshot.len();
            }
            self.show_terminal(&snapshot, i)?;
            tokio::time::sleep(tick).await;
        }

        Ok(())
    }

    /// Initialize, then dwell forever. Returns only on a fault.
    pub async fn run(&mut self) -> Result<Infallible, SchedulerFault> {
        self.initialize().await?;
        info!(trips = self.ctx.trips.len(), "scheduler running");

        loop {
            self.dwell().await?;
        }
    }

    fn spawn_cycle(&mut self) -> JoinHandle<RefreshOutput> {
        self.cycles += 1;
        let cycle = self.cycles;
        let ctx = Arc::clone(&self.ctx);

        tokio::spawn(async move {
            let now = chrono::Local::now().naive_local();
            run_cycle(&ctx, now, cycle).await
        })
    }

    fn show_compact(&self, output: &RefreshOutput) -> Result<(), SchedulerFault> {
        let lcd = &self.displays.compact;
        lcd.clear()?;

        if output.views.iter().all(|v| v.compact.is_empty()) {
            lcd.write_line(0, UNREACHABLE_PLACEHOLDER)?;
            return Ok(());
        }

        lcd.write_line(0, output.compact(0).unwrap_or_default())?;
        if output.len() > 1 {
            lcd.write_line(1, output.compact(1).unwrap_or_default())?;
        }

        Ok(())
    }

    fn show_terminal(&self, output: &RefreshOutput, tick: u32) -> Result<(), SchedulerFault> {
        let Some(verbose) = output.verbose(self.rotation) else {
            return Ok(());
        };

        let text = format!(
            "{}/{}=====\n{}\n{}",
            self.rotation + 1,
            output.len(),
            verbose,
            ".".repeat(tick as usize + 1)
        );
        self.displays.terminal.show(&text)?;
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

async fn join_cycle(handle: JoinHandle<RefreshOutput>) -> Result<RefreshOutput, SchedulerFault> {
    handle
        .await
        .map_err(|e| SchedulerFault::CycleAborted(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::display::{CompactDisplay, TerminalDisplay};
    use crate::domain::{ClockTime, RawDeparture, TripConfig};
    use crate::store::{DepartureFact, DepartureStore, StoreError};
    use crate::transit::{ConnectionSource, FetchError, MockConnectionSource};
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NullStore;

    impl DepartureStore for NullStore {
        fn store_bus_departure(&self, _fact: &DepartureFact) -> Result<(), StoreError> {
            Ok(())
        }

        fn store_rail_departure(&self, _fact: &DepartureFact) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingLcd {
        writes: Mutex<Vec<(usize, String)>>,
        clears: AtomicUsize,
    }

    impl CompactDisplay for RecordingLcd {
        fn clear(&self) -> Result<(), DisplayError> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn write_line(&self, row: usize, text: &str) -> Result<(), DisplayError> {
            self.writes.lock().unwrap().push((row, text.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingTerminal {
        shown: Mutex<Vec<String>>,
    }

    impl TerminalDisplay for RecordingTerminal {
        fn show(&self, text: &str) -> Result<(), DisplayError> {
            self.shown.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// Serves every route with every-ten-minute departures and counts queries.
    #[derive(Default)]
    struct EveryTenMinutes {
        queries: AtomicUsize,
    }

    #[async_trait]
    impl ConnectionSource for EveryTenMinutes {
        async fn connections(
            &self,
            _start: &str,
            _goal: &str,
            at: NaiveDateTime,
            _only_direct: bool,
        ) -> Result<Vec<RawDeparture>, FetchError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let from = ClockTime::from(at.time()).minutes_since_midnight();
            Ok((1..=3)
                .map(|k| {
                    let m = (from + 10 * k) % (24 * 60);
                    let t = ClockTime::from_hm(m / 60, m % 60).unwrap();
                    RawDeparture::new(t, t, vec!["S".to_string()])
                })
                .collect())
        }
    }

    fn trips() -> Vec<TripConfig> {
        vec![
            TripConfig::new("München-Mittersendling", "München Hbf", Some("=HBF=>"), true),
            TripConfig::new("Steinerstraße, München", "Am Harras, München", Some("=HARR=>"), true),
        ]
    }

    fn scheduler(
        source: Arc<dyn ConnectionSource>,
    ) -> (Scheduler, Arc<RecordingLcd>, Arc<RecordingTerminal>) {
        let lcd = Arc::new(RecordingLcd::default());
        let terminal = Arc::new(RecordingTerminal::default());
        let ctx = Arc::new(BoardContext::new(
            trips(),
            source,
            Arc::new(NullStore),
            BoardConfig::default(),
        ));
        let displays = Displays::new(lcd.clone(), terminal.clone());
        (Scheduler::new(ctx, displays), lcd, terminal)
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_publishes_first_cycle() {
        let (mut scheduler, _, _) = scheduler(Arc::new(EveryTenMinutes::default()));
        assert_eq!(scheduler.state(), SchedulerState::Initializing);

        scheduler.initialize().await.unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Cycling);
        let snapshot = scheduler.output_handle().snapshot().await;
        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.verbose(0).unwrap().starts_with("=HBF=> "));
    }

    #[tokio::test(start_paused = true)]
    async fn dwell_shows_both_trips_and_rotates() {
        let (mut scheduler, lcd, terminal) = scheduler(Arc::new(EveryTenMinutes::default()));
        scheduler.initialize().await.unwrap();

        scheduler.dwell().await.unwrap();

        assert_eq!(lcd.clears.load(Ordering::SeqCst), 1);
        let writes = lcd.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, 0);
        assert!(writes[0].1.starts_with("S | "));
        assert_eq!(writes[1].0, 1);

        let shown = terminal.shown.lock().unwrap().clone();
        assert_eq!(shown.len(), 30);
        // Rotation advances before the first tick, so trip 2 comes first.
        assert!(shown[0].starts_with("2/2=====\n=HARR=> "));
        assert!(shown[0].ends_with("\n."));
        assert!(shown[5].starts_with("1/2=====\n=HBF=> "));
        assert!(shown[29].ends_with(&".".repeat(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn dwell_lasts_one_refresh_period() {
        let (mut scheduler, _, _) = scheduler(Arc::new(EveryTenMinutes::default()));
        scheduler.initialize().await.unwrap();

        let started = tokio::time::Instant::now();
        scheduler.dwell().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn background_cycle_is_published_on_next_dwell() {
        let (mut scheduler, _, _) = scheduler(Arc::new(EveryTenMinutes::default()));
        let handle = scheduler.output_handle();
        scheduler.initialize().await.unwrap();

        scheduler.dwell().await.unwrap();
        // The cycle started by the first dwell is done but not yet shown.
        assert_eq!(handle.snapshot().await.cycle, 1);
        assert_eq!(scheduler.cycles_started(), 2);

        scheduler.dwell().await.unwrap();
        assert_eq!(handle.snapshot().await.cycle, 2);
        assert_eq!(scheduler.cycles_started(), 3);
    }

    /// Answers only once the gate has been opened.
    struct Gated {
        inner: EveryTenMinutes,
        open: tokio::sync::watch::Receiver<bool>,
    }

    #[async_trait]
    impl ConnectionSource for Gated {
        async fn connections(
            &self,
            start: &str,
            goal: &str,
            at: NaiveDateTime,
            only_direct: bool,
        ) -> Result<Vec<RawDeparture>, FetchError> {
            let mut open = self.open.clone();
            let _ = open.wait_for(|o| *o).await;
            self.inner.connections(start, goal, at, only_direct).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycle_keeps_previous_output() {
        let (tx, rx) = tokio::sync::watch::channel(true);
        let source = Arc::new(Gated {
            inner: EveryTenMinutes::default(),
            open: rx,
        });
        let ctx = Arc::new(BoardContext::new(
            trips(),
            source,
            Arc::new(NullStore),
            BoardConfig::default().with_fetch_timeout_secs(3600),
        ));
        let displays = Displays::new(
            Arc::new(RecordingLcd::default()),
            Arc::new(RecordingTerminal::default()),
        );
        let mut scheduler = Scheduler::new(ctx, displays);
        let handle = scheduler.output_handle();
        scheduler.initialize().await.unwrap();

        tx.send(false).unwrap();
        scheduler.dwell().await.unwrap();
        scheduler.dwell().await.unwrap();

        // Still waiting on cycle 2, and no further cycle was started.
        assert_eq!(handle.snapshot().await.cycle, 1);
        assert_eq!(scheduler.cycles_started(), 2);

        tx.send(true).unwrap();
        scheduler.dwell().await.unwrap();
        scheduler.dwell().await.unwrap();
        assert!(handle.snapshot().await.cycle >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn placeholder_when_nothing_fetched() {
        let source = MockConnectionSource::new();
        let (mut scheduler, lcd, _) = scheduler(Arc::new(source));
        scheduler.initialize().await.unwrap();

        scheduler.dwell().await.unwrap();

        let writes = lcd.writes.lock().unwrap().clone();
        assert_eq!(writes, vec![(0, UNREACHABLE_PLACEHOLDER.to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_trip_shown_when_first_trip_fails() {
        let departures = (0..24)
            .map(|h| {
                let t = ClockTime::from_hm(h, 30).unwrap();
                RawDeparture::new(t, t, vec!["BUS".to_string()])
            })
            .collect();
        let source = MockConnectionSource::new().with_route(
            "Steinerstraße, München",
            "Am Harras, München",
            departures,
        );
        let (mut scheduler, lcd, _) = scheduler(Arc::new(source));
        scheduler.initialize().await.unwrap();

        scheduler.dwell().await.unwrap();

        let writes = lcd.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], (0, String::new()));
        assert_eq!(writes[1].0, 1);
        assert!(writes[1].1.starts_with("BUS | "));
        assert!(writes.iter().all(|(_, text)| text != UNREACHABLE_PLACEHOLDER));
    }

    struct BrokenLcd;

    impl CompactDisplay for BrokenLcd {
        fn clear(&self) -> Result<(), DisplayError> {
            Err(DisplayError::Io(std::io::Error::other("i2c bus gone")))
        }

        fn write_line(&self, _row: usize, _text: &str) -> Result<(), DisplayError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn display_failure_is_a_fault() {
        let ctx = Arc::new(BoardContext::new(
            trips(),
            Arc::new(EveryTenMinutes::default()),
            Arc::new(NullStore),
            BoardConfig::default(),
        ));
        let displays = Displays::new(Arc::new(BrokenLcd), Arc::new(RecordingTerminal::default()));
        let mut scheduler = Scheduler::new(ctx, displays);

        let fault = scheduler.run().await.unwrap_err();
        assert!(matches!(fault, SchedulerFault::Display(_)));
    }

    struct Panicking;

    #[async_trait]
    impl ConnectionSource for Panicking {
        async fn connections(
            &self,
            _start: &str,
            _goal: &str,
            _at: NaiveDateTime,
            _only_direct: bool,
        ) -> Result<Vec<RawDeparture>, FetchError> {
            panic!("transport bug");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_cycle_is_a_fault() {
        let (mut scheduler, _, _) = scheduler(Arc::new(Panicking));

        let fault = scheduler.initialize().await.unwrap_err();
        assert!(matches!(fault, SchedulerFault::CycleAborted(_)));
        assert_eq!(scheduler.state(), SchedulerState::Initializing);
    }
}
