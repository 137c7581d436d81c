use thiserror::Error;

/// Session parameters that cannot start a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("total hours must be between 1 and 24, got {total}")]
    TotalHoursOutOfRange { total: i32 },

    #[error("desired game hours cannot be negative, got {game}")]
    NegativeGameHours { game: i32 },

    #[error("desired game hours ({game}) cannot exceed total session hours ({total})")]
    GameHoursExceedTotal { game: i32, total: i32 },
}

/// Why an operation was refused in the controller's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("a session is already in progress")]
    SessionAlreadyActive,

    #[error("no session is active")]
    NoActiveSession,

    #[error("the previous hour is still being resolved")]
    ResolutionInFlight,

    #[error("no hour resolution is pending")]
    NoPendingResolution,

    #[error("resolution ticket does not match the pending hour")]
    StaleResolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid session parameters: {0}")]
    Validation(#[from] ValidationError),

    #[error("rejected: {0}")]
    Rejected(RejectReason),
}

impl From<RejectReason> for EngineError {
    fn from(reason: RejectReason) -> Self {
        EngineError::Rejected(reason)
    }
}

/// Persistence read/write failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("simulated write failure")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::TotalHoursOutOfRange { total: 25 };
        assert_eq!(err.to_string(), "total hours must be between 1 and 24, got 25");

        let err = ValidationError::GameHoursExceedTotal { game: 5, total: 3 };
        assert_eq!(
            err.to_string(),
            "desired game hours (5) cannot exceed total session hours (3)"
        );
    }

    #[test]
    fn test_engine_error_from_reason() {
        let err: EngineError = RejectReason::NoActiveSession.into();
        assert_eq!(err, EngineError::Rejected(RejectReason::NoActiveSession));
        assert_eq!(err.to_string(), "rejected: no session is active");
    }
}
