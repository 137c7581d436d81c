use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::runtime::EngineEvent;

/// Handle returned by every scheduling request; pass it back to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Source of deferred engine events.
///
/// The engine never blocks: it asks for an event to be delivered later and
/// transitions only when that event is handed back to it.
pub trait Scheduler {
    fn schedule_once(&mut self, delay: Duration, event: EngineEvent) -> TimerHandle;
    fn schedule_repeating(&mut self, interval: Duration, event: EngineEvent) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Production scheduler: sleeper threads post into a channel that the owning
/// thread drains, so every state change still happens on a single thread.
#[derive(Debug)]
pub struct ThreadScheduler {
    tx: Sender<EngineEvent>,
    next_id: u64,
    live: HashMap<TimerHandle, Arc<AtomicBool>>,
}

impl ThreadScheduler {
    pub fn new() -> (Self, Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                tx,
                next_id: 0,
                live: HashMap::new(),
            },
            rx,
        )
    }

    fn register(&mut self) -> (TimerHandle, Arc<AtomicBool>) {
        // Threads that already finished have dropped their clone of the flag.
        self.live.retain(|_, flag| Arc::strong_count(flag) > 1);

        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let cancelled = Arc::new(AtomicBool::new(false));
        self.live.insert(handle, cancelled.clone());
        (handle, cancelled)
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_once(&mut self, delay: Duration, event: EngineEvent) -> TimerHandle {
        let (handle, cancelled) = self.register();
        let tx = self.tx.clone();

        thread::spawn(move || {
            thread::sleep(delay);
            if !cancelled.load(Ordering::SeqCst) {
                let _ = tx.send(event);
            }
        });

        handle
    }

    fn schedule_repeating(&mut self, interval: Duration, event: EngineEvent) -> TimerHandle {
        let (handle, cancelled) = self.register();
        let tx = self.tx.clone();

        thread::spawn(move || loop {
            thread::sleep(interval);
            if cancelled.load(Ordering::SeqCst) || tx.send(event).is_err() {
                break;
            }
        });

        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(flag) = self.live.remove(&handle) {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub handle: TimerHandle,
    pub period: Duration,
    pub event: EngineEvent,
    pub repeating: bool,
}

/// Deterministic scheduler for tests and simulations: nothing fires until
/// [`ManualScheduler::advance`] is called.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<ScheduledEvent>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[ScheduledEvent] {
        &self.pending
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    /// Fire everything once: one-shot events are consumed, repeating ones
    /// stay scheduled for the next call.
    pub fn advance(&mut self) -> Vec<EngineEvent> {
        let fired = self.pending.iter().map(|s| s.event).collect();
        self.pending.retain(|s| s.repeating);
        fired
    }

    fn push(&mut self, period: Duration, event: EngineEvent, repeating: bool) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(ScheduledEvent {
            handle,
            period,
            event,
            repeating,
        });
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&mut self, delay: Duration, event: EngineEvent) -> TimerHandle {
        self.push(delay, event, false)
    }

    fn schedule_repeating(&mut self, interval: Duration, event: EngineEvent) -> TimerHandle {
        self.push(interval, event, true)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|s| s.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_one_shot_fires_once() {
        let mut sched = ManualScheduler::new();
        let handle = sched.schedule_once(
            Duration::from_millis(10),
            EngineEvent::ResolutionSettled { ticket: 1 },
        );
        assert!(sched.is_scheduled(handle));

        let fired = sched.advance();
        assert_eq!(fired, vec![EngineEvent::ResolutionSettled { ticket: 1 }]);
        assert!(!sched.is_scheduled(handle));
        assert!(sched.advance().is_empty());
    }

    #[test]
    fn test_manual_repeating_keeps_firing_until_cancelled() {
        let mut sched = ManualScheduler::new();
        let handle = sched.schedule_repeating(
            Duration::from_secs(1),
            EngineEvent::CountdownTick { generation: 3 },
        );

        for _ in 0..3 {
            assert_eq!(sched.advance(), vec![EngineEvent::CountdownTick { generation: 3 }]);
        }

        sched.cancel(handle);
        assert!(sched.advance().is_empty());
    }

    #[test]
    fn test_handles_are_unique() {
        let mut sched = ManualScheduler::new();
        let a = sched.schedule_once(Duration::ZERO, EngineEvent::ResolutionSettled { ticket: 1 });
        let b = sched.schedule_once(Duration::ZERO, EngineEvent::ResolutionSettled { ticket: 2 });
        assert_ne!(a, b);
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_thread_scheduler_delivers_one_shot() {
        let (mut sched, rx) = ThreadScheduler::new();
        sched.schedule_once(
            Duration::from_millis(1),
            EngineEvent::ResolutionSettled { ticket: 9 },
        );

        let ev = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(ev, EngineEvent::ResolutionSettled { ticket: 9 });
    }

    #[test]
    fn test_thread_scheduler_cancel_suppresses_delivery() {
        let (mut sched, rx) = ThreadScheduler::new();
        let handle = sched.schedule_once(
            Duration::from_millis(200),
            EngineEvent::ResolutionSettled { ticket: 1 },
        );
        sched.cancel(handle);

        assert!(rx.recv_timeout(Duration::from_millis(400)).is_err());
    }

    #[test]
    fn test_thread_scheduler_repeating_stops_after_cancel() {
        let (mut sched, rx) = ThreadScheduler::new();
        let handle = sched.schedule_repeating(
            Duration::from_millis(2),
            EngineEvent::CountdownTick { generation: 1 },
        );

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        sched.cancel(handle);

        // drain anything already in flight, then expect silence
        std::thread::sleep(Duration::from_millis(20));
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
