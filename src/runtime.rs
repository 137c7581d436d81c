use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Deferred events the engine asks a [`crate::scheduler::Scheduler`] to deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// The settling delay of an in-flight hour resolution has elapsed.
    ResolutionSettled { ticket: u64 },
    /// One countdown tick for the timer run identified by `generation`.
    CountdownTick { generation: u64 },
}

/// Source of engine events (timer callbacks, settling delays).
pub trait EngineEventSource {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError>;
}

/// Event source fed by [`crate::scheduler::ThreadScheduler`]
pub struct ChannelEventSource {
    rx: Receiver<EngineEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<EngineEvent>) -> Self {
        Self { rx }
    }
}

impl EngineEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that hands scheduled events back to the owning thread one at a time
pub struct Runner<E: EngineEventSource> {
    event_source: E,
    poll_interval: Duration,
}

impl<E: EngineEventSource> Runner<E> {
    pub fn new(event_source: E, poll_interval: Duration) -> Self {
        Self {
            event_source,
            poll_interval,
        }
    }

    /// Blocks up to the poll interval and returns the next event, or None on timeout
    pub fn step(&self) -> Option<EngineEvent> {
        match self.event_source.recv_timeout(self.poll_interval) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
