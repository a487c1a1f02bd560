//! Virtual clock for deterministic runs
//!
//! Time only moves when the owner advances it. Timers due at the same
//! instant fire in the order they were scheduled.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use super::{duration_ms, Clock, TimerCallback, TimerHandle};

/// Clock driven by explicit `advance` calls
#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
    next_id: Cell<u64>,
    /// Pending timers keyed by (due, id)
    queue: RefCell<BTreeMap<(u64, u64), TimerCallback>>,
    due_by_id: RefCell<HashMap<u64, u64>>,
}

impl ManualClock {
    /// Create a clock starting at 0ms
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers still waiting to fire
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<u64> {
        self.queue.borrow().keys().next().map(|(due, _)| *due)
    }

    fn pop_due(&self, limit: u64) -> Option<(u64, TimerCallback)> {
        let mut queue = self.queue.borrow_mut();
        let key = *queue.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let callback = queue.remove(&key)?;
        self.due_by_id.borrow_mut().remove(&key.1);
        Some((key.0, callback))
    }

    fn fire(&self, due: u64, callback: TimerCallback) {
        if due > self.now.get() {
            self.now.set(due);
        }
        callback();
    }

    /// Move time forward by `by`, firing every timer that falls due,
    /// including timers scheduled by callbacks along the way.
    ///
    /// Returns the number of callbacks fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get().saturating_add(duration_ms(by));
        let mut fired = 0;
        while let Some((due, callback)) = self.pop_due(target) {
            self.fire(due, callback);
            fired += 1;
        }
        if target > self.now.get() {
            self.now.set(target);
        }
        fired
    }

    /// Jump to the earliest pending timer and fire it.
    pub fn advance_to_next(&self) -> bool {
        match self.pop_due(u64::MAX) {
            Some((due, callback)) => {
                self.fire(due, callback);
                true
            }
            None => false,
        }
    }

    /// Fire timers until none are left.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while self.advance_to_next() {
            fired += 1;
        }
        fired
    }

    /// Fire timers in order until `done` holds or the next timer lies beyond
    /// `limit` from now. Time ends at the limit when `done` never held.
    pub fn run_until(&self, limit: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = self.now.get().saturating_add(duration_ms(limit));
        loop {
            if done() {
                return true;
            }
            match self.next_due() {
                Some(due) if due <= deadline => {
                    self.advance_to_next();
                }
                _ => {
                    if deadline > self.now.get() {
                        self.now.set(deadline);
                    }
                    return done();
                }
            }
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let due = self.now.get().saturating_add(duration_ms(delay));

        self.queue.borrow_mut().insert((due, id), callback);
        self.due_by_id.borrow_mut().insert(id, due);

        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let due = self.due_by_id.borrow_mut().remove(&handle.id());
        if let Some(due) = due {
            let callback = self.queue.borrow_mut().remove(&(due, handle.id()));
            // dropped outside the queue borrow; it may own the last handle to a guard
            drop(callback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> TimerCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |label: &'static str| -> TimerCallback {
            let sink = Rc::clone(&sink);
            Box::new(move || sink.borrow_mut().push(label))
        };
        (log, make)
    }

    #[test]
    fn test_advance_fires_in_due_order() {
        let clock = ManualClock::new();
        let (log, make) = recorder();

        clock.schedule(Duration::from_millis(10), make("late"));
        clock.schedule(Duration::from_millis(5), make("early"));
        clock.schedule(Duration::from_millis(5), make("early-second"));

        assert_eq!(clock.advance(Duration::from_millis(4)), 0);
        assert_eq!(clock.advance(Duration::from_millis(1)), 2);
        assert_eq!(clock.now_ms(), 5);
        assert_eq!(clock.advance(Duration::from_millis(20)), 1);
        assert_eq!(clock.now_ms(), 25);
        assert_eq!(*log.borrow(), vec!["early", "early-second", "late"]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let clock = ManualClock::new();
        let (log, make) = recorder();

        let handle = clock.schedule(Duration::from_millis(1), make("cancelled"));
        clock.cancel(handle);
        clock.cancel(handle);
        assert_eq!(clock.pending(), 0);

        let fired = clock.schedule(Duration::ZERO, make("fired"));
        clock.advance(Duration::ZERO);
        clock.cancel(fired);

        assert_eq!(*log.borrow(), vec!["fired"]);
    }

    #[test]
    fn test_callbacks_can_schedule_more_timers() {
        let clock = Rc::new(ManualClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_clock = Rc::clone(&clock);
        let inner_log = Rc::clone(&log);
        clock.schedule(
            Duration::from_millis(5),
            Box::new(move || {
                inner_log.borrow_mut().push(inner_clock.now_ms());
                let log = Rc::clone(&inner_log);
                let at = Rc::clone(&inner_clock);
                inner_clock.schedule(
                    Duration::from_millis(10),
                    Box::new(move || log.borrow_mut().push(at.now_ms())),
                );
            }),
        );

        assert_eq!(clock.advance(Duration::from_millis(20)), 2);
        assert_eq!(*log.borrow(), vec![5, 15]);
    }

    #[test]
    fn test_run_until_stops_at_limit() {
        let clock = ManualClock::new();
        let (log, make) = recorder();

        clock.schedule(Duration::from_millis(50), make("inside"));
        clock.schedule(Duration::from_millis(500), make("outside"));

        let done = clock.run_until(Duration::from_millis(200), || false);
        assert!(!done);
        assert_eq!(clock.now_ms(), 200);
        assert_eq!(*log.borrow(), vec!["inside"]);
        assert_eq!(clock.next_due(), Some(500));

        assert_eq!(clock.run_until_idle(), 1);
        assert_eq!(clock.now_ms(), 500);
    }

    #[test]
    fn test_run_until_returns_early_when_done() {
        let clock = ManualClock::new();
        let (log, make) = recorder();

        clock.schedule(Duration::from_millis(1), make("one"));
        clock.schedule(Duration::from_millis(2), make("two"));

        let watched = Rc::clone(&log);
        assert!(clock.run_until(Duration::from_millis(100), || !watched.borrow().is_empty()));
        assert_eq!(clock.now_ms(), 1);
        assert_eq!(clock.pending(), 1);
    }
}
