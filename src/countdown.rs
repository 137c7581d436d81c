use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runtime::EngineEvent;
use crate::scheduler::{Scheduler, TimerHandle};

pub const ONE_HOUR_SECS: u32 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CountdownStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Expired,
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownState {
    pub remaining_seconds: u32,
    pub running: bool,
}

impl CountdownState {
    /// Split into (hours, minutes, seconds).
    pub fn hms(&self) -> (u32, u32, u32) {
        let secs = self.remaining_seconds;
        (secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale or unexpected tick; state untouched.
    Ignored,
    Ticked { remaining_seconds: u32 },
    Expired,
}

/// One-hour countdown driven by a recurring scheduled tick.
///
/// Each run gets a fresh `generation`; ticks carrying an older generation are
/// dropped, so nothing scheduled before a pause or reset can touch the clock.
#[derive(Debug)]
pub struct CountdownTimer {
    status: CountdownStatus,
    remaining_seconds: u32,
    duration_secs: u32,
    tick_interval: Duration,
    generation: u64,
    tick: Option<TimerHandle>,
}

impl CountdownTimer {
    pub fn new(duration_secs: u32, tick_interval: Duration) -> Self {
        Self {
            status: CountdownStatus::Idle,
            remaining_seconds: duration_secs,
            duration_secs,
            tick_interval,
            generation: 0,
            tick: None,
        }
    }

    pub fn one_hour() -> Self {
        Self::new(ONE_HOUR_SECS, Duration::from_secs(1))
    }

    pub fn status(&self) -> CountdownStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> CountdownState {
        CountdownState {
            remaining_seconds: self.remaining_seconds,
            running: self.status == CountdownStatus::Running,
        }
    }

    /// Idle/Paused -> Running. No effect from Running or Expired.
    pub fn start<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> CountdownState {
        match self.status {
            CountdownStatus::Idle | CountdownStatus::Paused => {
                self.generation += 1;
                let handle = scheduler.schedule_repeating(
                    self.tick_interval,
                    EngineEvent::CountdownTick {
                        generation: self.generation,
                    },
                );
                self.tick = Some(handle);
                self.status = CountdownStatus::Running;
                tracing::debug!(
                    remaining_seconds = self.remaining_seconds,
                    generation = self.generation,
                    "countdown started"
                );
            }
            CountdownStatus::Running | CountdownStatus::Expired => {}
        }
        self.state()
    }

    /// Running -> Paused. No effect from any other state.
    pub fn pause<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> CountdownState {
        if self.status == CountdownStatus::Running {
            self.cancel_tick(scheduler);
            self.status = CountdownStatus::Paused;
            tracing::debug!(remaining_seconds = self.remaining_seconds, "countdown paused");
        }
        self.state()
    }

    /// Any state -> Idle with a full hour on the clock.
    pub fn reset<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> CountdownState {
        self.cancel_tick(scheduler);
        self.generation += 1;
        self.remaining_seconds = self.duration_secs;
        self.status = CountdownStatus::Idle;
        self.state()
    }

    pub fn on_tick<S: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        generation: u64,
    ) -> TickOutcome {
        if self.status != CountdownStatus::Running || generation != self.generation {
            tracing::trace!(
                generation,
                current = self.generation,
                "ignoring stale countdown tick"
            );
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.cancel_tick(scheduler);
            self.status = CountdownStatus::Expired;
            tracing::info!("countdown expired");
            return TickOutcome::Expired;
        }

        TickOutcome::Ticked {
            remaining_seconds: self.remaining_seconds,
        }
    }

    fn cancel_tick<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.tick.take() {
            scheduler.cancel(handle);
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::one_hour()
    }
}
