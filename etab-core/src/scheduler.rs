//! One-shot timer facilities for driving reveal sessions.
//!
//! The reveal engine never sleeps or spawns. It asks a [`Scheduler`] to arm a
//! timer and is told, through `RevealEngine::fire`, when that timer is due.
//! Two implementations live here:
//!
//! - [`VirtualClock`]: deterministic virtual time for tests. Nothing happens
//!   until the test advances the clock.
//! - [`TokioTimers`]: one `tokio::time::sleep` task per timer. The due timer
//!   id is delivered over an unbounded mpsc channel wrapped in the caller's
//!   event type, so it lands on the same event bus as key presses and renders.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

use crate::error::ScheduleError;

/// Identifies one armed timer. Ids are never reused by a scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A facility that arms and disarms one-shot timers.
pub trait Scheduler {
    /// Arms a timer that becomes due after `delay`.
    fn schedule(&mut self, delay: Duration) -> Result<TimerId, ScheduleError>;

    /// Disarms `id`. Unknown, fired, or already cancelled ids are ignored.
    fn cancel(&mut self, id: TimerId);

    /// Called once a due timer has been delivered to its owner.
    fn retire(&mut self, _id: TimerId) {}
}

// ---------------------------------------------------------------------------
// Virtual clock
// ---------------------------------------------------------------------------

/// Deterministic scheduler backed by virtual time.
///
/// Timers are ordered by deadline, then by the order they were armed.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    next_id: u64,
    queue: BTreeSet<(Duration, TimerId)>,
    armed: HashMap<TimerId, Duration>,
    refuse: bool,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the clock was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.armed.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.first().map(|(deadline, _)| *deadline)
    }

    /// While `true`, every `schedule` call fails with [`ScheduleError::Refused`].
    pub fn refuse_timers(&mut self, refuse: bool) {
        self.refuse = refuse;
    }

    /// Removes and returns the earliest timer due at or before `until`,
    /// moving the clock to that timer's deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let &(deadline, id) = self.queue.first()?;
        if deadline > until {
            return None;
        }
        self.queue.remove(&(deadline, id));
        self.armed.remove(&id);
        self.now = self.now.max(deadline);
        Some(id)
    }

    /// Moves the clock forward by `by` and returns every timer that fell due,
    /// in firing order.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerId> {
        let target = self.now + by;
        let mut due = Vec::new();
        while let Some(id) = self.pop_due(target) {
            due.push(id);
        }
        self.now = target;
        due
    }

    /// Moves the clock to `target` if that is in the future.
    pub(crate) fn settle(&mut self, target: Duration) {
        self.now = self.now.max(target);
    }
}

impl Scheduler for VirtualClock {
    fn schedule(&mut self, delay: Duration) -> Result<TimerId, ScheduleError> {
        if self.refuse {
            return Err(ScheduleError::Refused);
        }
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let deadline = self.now + delay;
        self.queue.insert((deadline, id));
        self.armed.insert(id, deadline);
        Ok(id)
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(deadline) = self.armed.remove(&id) {
            self.queue.remove(&(deadline, id));
        }
    }
}

// ---------------------------------------------------------------------------
// Tokio timers
// ---------------------------------------------------------------------------

/// Scheduler that arms real timers on the current tokio runtime.
///
/// When a timer elapses, `wrap(id)` is sent over `tx`. Cancelling aborts the
/// sleeping task; a delivery that was already queued before the abort still
/// arrives, which is why the engine also unregisters cancelled ids.
pub struct TokioTimers<E> {
    tx: UnboundedSender<E>,
    wrap: fn(TimerId) -> E,
    tasks: HashMap<TimerId, AbortHandle>,
    next_id: u64,
}

impl<E> TokioTimers<E> {
    pub fn new(tx: UnboundedSender<E>, wrap: fn(TimerId) -> E) -> Self {
        Self {
            tx,
            wrap,
            tasks: HashMap::new(),
            next_id: 0,
        }
    }

    /// Number of timers whose tasks have not been cancelled or retired.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

impl<E: Send + 'static> Scheduler for TokioTimers<E> {
    fn schedule(&mut self, delay: Duration) -> Result<TimerId, ScheduleError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;
        if self.tx.is_closed() {
            return Err(ScheduleError::Refused);
        }

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let event = (self.wrap)(id);
        let tx = self.tx.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
        self.tasks.insert(id, task.abort_handle());
        Ok(id)
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }

    fn retire(&mut self, id: TimerId) {
        self.tasks.remove(&id);
    }
}

impl<E> Drop for TokioTimers<E> {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn virtual_clock_fires_in_deadline_then_arm_order() {
        let mut clock = VirtualClock::new();
        let late = clock.schedule(MS * 30).unwrap();
        let first = clock.schedule(MS * 10).unwrap();
        let second = clock.schedule(MS * 10).unwrap();

        assert_eq!(clock.advance(MS * 9), Vec::<TimerId>::new());
        assert_eq!(clock.advance(MS), vec![first, second]);
        assert_eq!(clock.now(), MS * 10);
        assert_eq!(clock.next_deadline(), Some(MS * 30));
        assert_eq!(clock.advance(MS * 100), vec![late]);
        assert_eq!(clock.now(), MS * 110);
    }

    #[test]
    fn cancelled_timer_never_fires_and_cancel_is_idempotent() {
        let mut clock = VirtualClock::new();
        let id = clock.schedule(MS * 5).unwrap();
        clock.cancel(id);
        clock.cancel(id);
        assert_eq!(clock.pending(), 0);
        assert!(clock.advance(MS * 50).is_empty());
    }

    #[test]
    fn refused_timers_report_an_error() {
        let mut clock = VirtualClock::new();
        clock.refuse_timers(true);
        assert_eq!(clock.schedule(MS), Err(ScheduleError::Refused));
        clock.refuse_timers(false);
        assert!(clock.schedule(MS).is_ok());
    }

    #[test]
    fn tokio_timers_need_a_runtime() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<TimerId>();
        let mut timers = TokioTimers::new(tx, |id| id);
        assert_eq!(timers.schedule(MS), Err(ScheduleError::NoRuntime));
    }
}
