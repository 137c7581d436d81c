use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ValidationError;
use crate::outcome::Outcome;
use crate::stats::SessionRecord;

pub const MAX_SESSION_HOURS: i32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    /// An hour has been drawn and is waiting out its settling delay.
    AwaitingResolution,
    /// Final hour committed; lifetime stats are being finalized.
    Complete,
}

/// The in-progress allocation. Exists only between `start` and session end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub total_hours: u32,
    pub desired_game_hours: u32,
    pub probability_game: f64,
    /// 1-indexed hour currently being played; never passes `total_hours`.
    pub current_hour: u32,
    pub session_study_hours: u32,
    pub session_game_hours: u32,
    pub last_spin_result: Option<Outcome>,
}

impl SessionState {
    pub fn new(total_hours: i32, desired_game_hours: i32) -> Result<Self, ValidationError> {
        if !(1..=MAX_SESSION_HOURS).contains(&total_hours) {
            return Err(ValidationError::TotalHoursOutOfRange { total: total_hours });
        }
        if desired_game_hours < 0 {
            return Err(ValidationError::NegativeGameHours {
                game: desired_game_hours,
            });
        }
        if desired_game_hours > total_hours {
            return Err(ValidationError::GameHoursExceedTotal {
                game: desired_game_hours,
                total: total_hours,
            });
        }

        // both checked non-negative above
        let total = total_hours.unsigned_abs();
        let game = desired_game_hours.unsigned_abs();

        Ok(Self {
            total_hours: total,
            desired_game_hours: game,
            probability_game: f64::from(game) / f64::from(total),
            current_hour: 1,
            session_study_hours: 0,
            session_game_hours: 0,
            last_spin_result: None,
        })
    }

    pub fn resolved_hours(&self) -> u32 {
        self.session_study_hours + self.session_game_hours
    }

    pub fn is_final_hour(&self) -> bool {
        self.current_hour >= self.total_hours
    }

    /// Tally one hour. Does not advance `current_hour`.
    pub(crate) fn commit(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Study => self.session_study_hours += 1,
            Outcome::Game => self.session_game_hours += 1,
        }
        self.last_spin_result = Some(outcome);
    }

    pub fn record(&self, date: NaiveDate) -> SessionRecord {
        SessionRecord {
            date,
            study_hours: self.session_study_hours,
            game_hours: self.session_game_hours,
        }
    }
}
