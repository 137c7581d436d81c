use chrono::{NaiveDate, Utc};

use crate::config::EngineConfig;
use crate::countdown::{CountdownState, CountdownStatus, CountdownTimer, TickOutcome};
use crate::error::{ConfigError, EngineError, RejectReason, StoreError};
use crate::outcome::{Outcome, OutcomeEngine, SpinDraw};
use crate::progression::{self, ProgressionEvent};
use crate::runtime::EngineEvent;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::session::{SessionPhase, SessionState};
use crate::stats::{SessionRecord, Stats};
use crate::store::StatsStore;

/// Returned when an hour is drawn; the result commits once `ticket` settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinStarted {
    pub ticket: u64,
    pub hour: u32,
    pub draw: SpinDraw,
}

#[derive(Debug)]
pub struct HourResolution {
    pub outcome: Outcome,
    /// The hour that was just committed.
    pub hour: u32,
    /// Session state right after the commit.
    pub session: SessionState,
    /// Present when this was the final hour.
    pub finish: Option<SessionFinish>,
}

#[derive(Debug)]
pub struct SessionFinish {
    pub record: SessionRecord,
    pub full: bool,
    pub events: Vec<ProgressionEvent>,
    /// Stats are correct in memory even when this is set; only the write failed.
    pub persist_warning: Option<StoreError>,
}

#[derive(Debug)]
pub enum EngineNotice {
    HourResolved(HourResolution),
    CountdownExpired,
}

#[derive(Debug, Clone, Copy)]
struct PendingResolution {
    ticket: u64,
    draw: SpinDraw,
    handle: TimerHandle,
}

/// Runs one session at a time and keeps the lifetime ledger.
///
/// Phases go `Idle -> Active -> AwaitingResolution -> Active ... -> Complete -> Idle`,
/// with `end_session_early` available from `Active`. Nothing else mutates the
/// lifetime [`Stats`].
///
/// Single-writer: every method takes `&mut self`, and scheduled callbacks come
/// back through [`SessionController::handle_event`] on the owning thread. Share
/// across threads only behind a mutex.
pub struct SessionController<St: StatsStore, Sc: Scheduler> {
    config: EngineConfig,
    stats: Stats,
    store: St,
    scheduler: Sc,
    engine: OutcomeEngine,
    timer: CountdownTimer,
    session: Option<SessionState>,
    phase: SessionPhase,
    pending: Option<PendingResolution>,
    next_ticket: u64,
}

impl<St: StatsStore, Sc: Scheduler> SessionController<St, Sc> {
    /// Loads lifetime stats from `store`; unreadable data starts from defaults.
    pub fn new(config: EngineConfig, store: St, scheduler: Sc) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut stats = store.load();
        // stored exp past the level threshold is paid out before play
        let pending_levels = progression::apply_level_ups(&mut stats);
        tracing::debug!(
            pending_levels = pending_levels.len(),
            level = stats.level,
            total_study_hours = stats.total_study_hours,
            total_game_hours = stats.total_game_hours,
            "loaded lifetime stats"
        );

        Ok(Self {
            timer: CountdownTimer::new(config.hour_secs, config.tick_interval()),
            config,
            stats,
            store,
            scheduler,
            engine: OutcomeEngine::new(),
            session: None,
            phase: SessionPhase::Idle,
            pending: None,
            next_ticket: 0,
        })
    }

    /// Swap the random source, e.g. for a seeded engine.
    pub fn with_engine(mut self, engine: OutcomeEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn session_state(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn scheduler(&self) -> &Sc {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Sc {
        &mut self.scheduler
    }

    pub fn start(
        &mut self,
        total_hours: i32,
        desired_game_hours: i32,
    ) -> Result<SessionState, EngineError> {
        if self.phase != SessionPhase::Idle {
            return Err(RejectReason::SessionAlreadyActive.into());
        }

        let session = SessionState::new(total_hours, desired_game_hours)?;
        tracing::info!(
            total_hours = session.total_hours,
            desired_game_hours = session.desired_game_hours,
            probability_game = session.probability_game,
            "session started"
        );

        self.session = Some(session.clone());
        self.phase = SessionPhase::Active;
        Ok(session)
    }

    /// Draw the current hour. The tally commits after the settling delay, when
    /// the scheduled [`EngineEvent::ResolutionSettled`] is handed back.
    pub fn resolve_hour(&mut self) -> Result<SpinStarted, EngineError> {
        match self.phase {
            SessionPhase::Active => {}
            SessionPhase::AwaitingResolution => {
                return Err(RejectReason::ResolutionInFlight.into());
            }
            SessionPhase::Idle | SessionPhase::Complete => {
                return Err(RejectReason::NoActiveSession.into());
            }
        }
        let Some(session) = self.session.as_ref() else {
            return Err(RejectReason::NoActiveSession.into());
        };

        let draw = self.engine.spin(session.probability_game);
        let hour = session.current_hour;

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let handle = self.scheduler.schedule_once(
            self.config.resolution_delay(),
            EngineEvent::ResolutionSettled { ticket },
        );

        self.pending = Some(PendingResolution {
            ticket,
            draw,
            handle,
        });
        self.phase = SessionPhase::AwaitingResolution;
        tracing::debug!(hour, ticket, outcome = %draw.outcome, "hour drawn");

        Ok(SpinStarted { ticket, hour, draw })
    }

    /// Commit the drawn hour for `ticket`.
    pub fn settle_resolution(&mut self, ticket: u64) -> Result<HourResolution, EngineError> {
        if self.phase != SessionPhase::AwaitingResolution {
            return Err(RejectReason::NoPendingResolution.into());
        }
        let pending = match self.pending {
            Some(pending) if pending.ticket == ticket => pending,
            Some(_) => return Err(RejectReason::StaleResolution.into()),
            None => return Err(RejectReason::NoPendingResolution.into()),
        };
        let Some(mut session) = self.session.take() else {
            return Err(RejectReason::NoActiveSession.into());
        };

        self.pending = None;
        self.scheduler.cancel(pending.handle);

        let outcome = pending.draw.outcome;
        let hour = session.current_hour;
        session.commit(outcome);
        self.timer.reset(&mut self.scheduler);
        tracing::info!(
            hour,
            total_hours = session.total_hours,
            outcome = %outcome,
            "hour resolved"
        );

        if session.is_final_hour() {
            self.phase = SessionPhase::Complete;
            let snapshot = session.clone();
            let finish = self.end_session(session, true);
            return Ok(HourResolution {
                outcome,
                hour,
                session: snapshot,
                finish: Some(finish),
            });
        }

        session.current_hour += 1;
        let snapshot = session.clone();
        self.session = Some(session);
        self.phase = SessionPhase::Active;

        Ok(HourResolution {
            outcome,
            hour,
            session: snapshot,
            finish: None,
        })
    }

    /// Stop before the last hour. Only valid between resolutions.
    pub fn end_session_early(&mut self) -> Result<SessionFinish, EngineError> {
        match self.phase {
            SessionPhase::Active => {}
            SessionPhase::AwaitingResolution => {
                return Err(RejectReason::ResolutionInFlight.into());
            }
            SessionPhase::Idle | SessionPhase::Complete => {
                return Err(RejectReason::NoActiveSession.into());
            }
        }
        let Some(session) = self.session.take() else {
            return Err(RejectReason::NoActiveSession.into());
        };

        Ok(self.end_session(session, false))
    }

    fn end_session(&mut self, session: SessionState, full: bool) -> SessionFinish {
        let record = session.record(today());

        if record.total_hours() > 0 {
            self.stats.session_history.push(record.clone());
        }
        let stats = &mut self.stats;
        stats.total_study_hours = stats.total_study_hours.saturating_add(record.study_hours);
        stats.total_game_hours = stats.total_game_hours.saturating_add(record.game_hours);
        if full {
            stats.total_sessions_completed = stats.total_sessions_completed.saturating_add(1);
        }

        let mut events = Vec::new();
        if record.study_hours > 0 {
            events.extend(progression::award_experience(
                &mut self.stats,
                record.study_hours,
            ));
        }
        events.extend(progression::record_performance(&mut self.stats, &record));

        let persist_warning = self.persist();

        self.session = None;
        self.phase = SessionPhase::Idle;
        tracing::info!(
            full,
            study_hours = record.study_hours,
            game_hours = record.game_hours,
            level = self.stats.level,
            "session finished"
        );

        SessionFinish {
            record,
            full,
            events,
            persist_warning,
        }
    }

    fn persist(&self) -> Option<StoreError> {
        match self.store.save(&self.stats) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist stats; in-memory stats kept");
                Some(err)
            }
        }
    }

    /// Wipe lifetime stats. The caller is responsible for confirming first.
    ///
    /// In-memory stats are reset even when clearing storage fails.
    pub fn reset_stats(&mut self) -> Result<Stats, StoreError> {
        self.stats = Stats::default();
        tracing::info!("lifetime stats reset");
        match self.store.clear() {
            Ok(()) => Ok(self.stats.clone()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to clear stored stats");
                Err(err)
            }
        }
    }

    pub fn countdown(&self) -> CountdownState {
        self.timer.state()
    }

    pub fn countdown_status(&self) -> CountdownStatus {
        self.timer.status()
    }

    pub fn timer_start(&mut self) -> CountdownState {
        self.timer.start(&mut self.scheduler)
    }

    pub fn timer_pause(&mut self) -> CountdownState {
        self.timer.pause(&mut self.scheduler)
    }

    pub fn timer_reset(&mut self) -> CountdownState {
        self.timer.reset(&mut self.scheduler)
    }

    pub fn on_countdown_tick(&mut self, generation: u64) -> TickOutcome {
        self.timer.on_tick(&mut self.scheduler, generation)
    }

    /// Feed a scheduled event back in.
    pub fn handle_event(&mut self, event: EngineEvent) -> Result<Option<EngineNotice>, EngineError> {
        match event {
            EngineEvent::ResolutionSettled { ticket } => self
                .settle_resolution(ticket)
                .map(|resolution| Some(EngineNotice::HourResolved(resolution))),
            EngineEvent::CountdownTick { generation } => match self.on_countdown_tick(generation) {
                TickOutcome::Expired => Ok(Some(EngineNotice::CountdownExpired)),
                TickOutcome::Ticked { .. } | TickOutcome::Ignored => Ok(None),
            },
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
