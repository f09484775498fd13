//! Restarting the scheduler after faults.
//!
//! The supervisor is a state machine `Init -> Cycling -> Faulted -> Cooldown
//! -> Init`. A fault escaping the scheduler is shown on the displays with a
//! countdown, after which a fresh scheduler is started. Restarts are
//! unbounded.

use std::convert::Infallible;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::display::{DisplayError, Displays};

use super::cycle::BoardContext;
use super::scheduler::{Scheduler, SchedulerFault, SchedulerState};

/// Supervisor lifecycle.
#[derive(Debug)]
pub enum SupervisorState {
    /// About to start a fresh scheduler.
    Init,
    /// The scheduler is running.
    Cycling,
    /// The scheduler stopped with this fault.
    Faulted(SchedulerFault),
    /// Counting down to a restart.
    Cooldown { message: String },
}

pub struct Supervisor {
    ctx: Arc<BoardContext>,
    displays: Displays,
    state: SupervisorState,
    scheduler: Option<Scheduler>,
    restarts: u64,
}

impl Supervisor {
    pub fn new(ctx: Arc<BoardContext>, displays: Displays) -> Self {
        Self {
            ctx,
            displays,
            state: SupervisorState::Init,
            scheduler: None,
            restarts: 0,
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    /// State of the current scheduler, if one exists.
    pub fn scheduler_state(&self) -> Option<SchedulerState> {
        self.scheduler.as_ref().map(Scheduler::state)
    }

    /// Completed restarts.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Perform one state transition.
    ///
    /// From `Cycling` this only returns once the scheduler faults, and from
    /// `Cooldown` once the countdown is over.
    pub async fn advance(&mut self) {
        let next = match &self.state {
            SupervisorState::Init => {
                self.scheduler = Some(Scheduler::new(
                    Arc::clone(&self.ctx),
                    self.displays.clone(),
                ));
                SupervisorState::Cycling
            }

            SupervisorState::Cycling => match self.scheduler.as_mut() {
                Some(scheduler) => {
                    let fault = match scheduler.run().await {
                        Ok(never) => match never {},
                        Err(fault) => fault,
                    };
                    error!(error = %fault, restarts = self.restarts, "scheduler fault");
                    self.scheduler = None;
                    SupervisorState::Faulted(fault)
                }
                None => SupervisorState::Init,
            },

            SupervisorState::Faulted(fault) => SupervisorState::Cooldown {
                message: fault.to_string(),
            },

            SupervisorState::Cooldown { message } => {
                let message = message.clone();
                self.cooldown(&message).await;
                self.restarts += 1;
                info!(restarts = self.restarts, "restarting scheduler");
                SupervisorState::Init
            }
        };

        self.state = next;
    }

    /// Supervise forever.
    pub async fn run(&mut self) -> Infallible {
        loop {
            self.advance().await;
        }
    }

    async fn cooldown(&self, message: &str) {
        let config = &self.ctx.config;
        let tick = config.cooldown_tick();

        for i in 0..config.cooldown_ticks {
            let remaining = (config.cooldown_ticks - i) as u64 * config.cooldown_tick_millis / 1000;

            if let Err(e) = self.show_countdown(message, remaining, i) {
                warn!(error = %e, "failed to show restart countdown");
            }
            tokio::time::sleep(tick).await;
        }
    }

    fn show_countdown(&self, message: &str, remaining: u64, tick: u32) -> Result<(), DisplayError> {
        let lcd = &self.displays.compact;
        lcd.clear()?;
        lcd.write_line(0, "Error: restart")?;
        lcd.write_line(1, &format!("in {remaining}s"))?;

        self.displays.terminal.show(&format!(
            "{message}\nrestart in {remaining}s\n{}",
            ".".repeat(tick as usize + 1)
        ))
    }
}
