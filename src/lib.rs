// Library surface for embedding the engine behind any presentation layer.
// Rendering, input widgets and themes live with the host, not here.
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod outcome;
pub mod progression;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod store;
pub mod util;

pub use config::{ConfigStore, EngineConfig, FileConfigStore, StatsBackend};
pub use controller::{EngineNotice, HourResolution, SessionController, SessionFinish, SpinStarted};
pub use countdown::{CountdownState, CountdownStatus, CountdownTimer};
pub use error::{ConfigError, EngineError, RejectReason, StoreError, ValidationError};
pub use outcome::{Outcome, OutcomeEngine, SpinDraw};
pub use progression::{Achievement, ProgressionEvent, Rank};
pub use runtime::EngineEvent;
pub use scheduler::{ManualScheduler, Scheduler, ThreadScheduler, TimerHandle};
pub use session::{SessionPhase, SessionState};
pub use stats::{SessionRecord, Stats};
pub use store::{FileStatsStore, MemoryStatsStore, SqliteStatsStore, StatsStore};
