//! Wall-clock timers on the tokio runtime
//!
//! Each scheduled callback is a local task sleeping for its delay, so the
//! clock must be used from inside a [`tokio::task::LocalSet`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::trace;

use super::{duration_ms, Clock, TimerCallback, TimerHandle};

/// Clock backed by `tokio::time`
pub struct RuntimeClock {
    origin: Instant,
    next_id: Cell<u64>,
    tasks: Rc<RefCell<HashMap<u64, AbortHandle>>>,
}

impl RuntimeClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            next_id: Cell::new(0),
            tasks: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Number of timers that have neither fired nor been cancelled
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RuntimeClock {
    fn now_ms(&self) -> u64 {
        duration_ms(self.origin.elapsed())
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let tasks = Rc::clone(&self.tasks);
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            tasks.borrow_mut().remove(&id);
            callback();
        });

        trace!("timer {} scheduled in {}ms", id, delay.as_millis());
        self.tasks.borrow_mut().insert(id, task.abort_handle());
        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let task = self.tasks.borrow_mut().remove(&handle.id());
        if let Some(task) = task {
            trace!("timer {} cancelled", handle.id());
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    fn block_on_local<F: std::future::Future>(future: F) -> F::Output {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        LocalSet::new().block_on(&runtime, future)
    }

    #[test]
    fn test_runtime_clock_fires_and_cancels() {
        let fired = block_on_local(async {
            let clock = RuntimeClock::new();
            let fired = Rc::new(RefCell::new(Vec::new()));

            let sink = Rc::clone(&fired);
            clock.schedule(
                Duration::from_millis(5),
                Box::new(move || sink.borrow_mut().push("kept")),
            );
            let sink = Rc::clone(&fired);
            let cancelled = clock.schedule(
                Duration::from_millis(5),
                Box::new(move || sink.borrow_mut().push("cancelled")),
            );
            clock.cancel(cancelled);
            clock.cancel(cancelled);
            assert_eq!(clock.pending(), 1);

            tokio::time::sleep(Duration::from_millis(30)).await;
            assert_eq!(clock.pending(), 0);
            assert!(clock.now_ms() >= 30);

            let log = fired.borrow().clone();
            log
        });

        assert_eq!(fired, vec!["kept"]);
    }
}
