//! Per-test asynchronous guard
//!
//! An [`AsyncGuard`] owns the lifecycle of one test: it runs the body and
//! any deferred continuations, enforces the armed deadline and decides the
//! single terminal outcome.
//!
//! ```text
//! Idle --timeout()--> Armed --async_()--> Running --finished()--> Completed
//!                       \                    \
//!                        +----deadline-------+--> TimedOut
//! ```
//!
//! A body that never arms a deadline is synchronous and resolves as soon as
//! it returns. Once resolved, further continuations still run but their
//! faults and completion signals are ignored.

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::clock::{duration_ms, Clock, TimerHandle};
use crate::error::{ConfigurationError, Fault, StepResult};
use crate::models::{Hook, TestOutcome, TestRecord};

type ResolveFn = Box<dyn FnOnce(TestRecord)>;
type Continuation = Box<dyn FnOnce(&AsyncGuard) -> StepResult>;

/// Lifecycle state of a guarded test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    /// No deadline armed
    Idle,
    /// Deadline armed, no continuation created yet
    Armed,
    /// Deadline armed and asynchronous work outstanding
    Running,
    /// Completion signalled
    Completed,
    /// Deadline elapsed before completion
    TimedOut,
}

struct GuardInner {
    state: GuardState,
    deadline: Option<u64>,
    limit_ms: u64,
    /// Bumped on every re-arm so stale deadline callbacks can tell
    generation: u64,
    pending_timer: Option<TimerHandle>,
    fault: Option<Fault>,
    /// Segments currently executing on the stack
    depth: usize,
    finalizing: bool,
    outcome: Option<TestOutcome>,
    started_at: u64,
    tear_down: Option<Hook>,
    on_resolve: Option<ResolveFn>,
}

/// Handle to one test's asynchronous context.
///
/// Cheap to clone; every clone refers to the same test.
#[derive(Clone)]
pub struct AsyncGuard {
    selector: Rc<str>,
    clock: Rc<dyn Clock>,
    inner: Rc<RefCell<GuardInner>>,
}

impl AsyncGuard {
    /// Create a guard for `selector` driven by `clock`
    pub fn new(selector: impl Into<String>, clock: Rc<dyn Clock>) -> Self {
        let started_at = clock.now_ms();
        Self {
            selector: Rc::from(selector.into()),
            clock,
            inner: Rc::new(RefCell::new(GuardInner {
                state: GuardState::Idle,
                deadline: None,
                limit_ms: 0,
                generation: 0,
                pending_timer: None,
                fault: None,
                depth: 0,
                finalizing: false,
                outcome: None,
                started_at,
                tear_down: None,
                on_resolve: None,
            })),
        }
    }

    /// Hook run once the outcome is decided, before the record is handed out
    pub fn with_tear_down(self, hook: Hook) -> Self {
        self.inner.borrow_mut().tear_down = Some(hook);
        self
    }

    /// Receiver of the single terminal record
    pub fn on_resolve(self, resolve: impl FnOnce(TestRecord) + 'static) -> Self {
        self.inner.borrow_mut().on_resolve = Some(Box::new(resolve));
        self
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Clock this test is scheduled on
    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    pub fn state(&self) -> GuardState {
        self.inner.borrow().state
    }

    pub fn outcome(&self) -> Option<TestOutcome> {
        self.inner.borrow().outcome
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome().is_some()
    }

    /// Clock time at which the armed deadline elapses
    pub fn deadline_ms(&self) -> Option<u64> {
        self.inner.borrow().deadline
    }

    /// True strictly between arming a deadline and completion or timeout
    pub fn is_async(&self) -> bool {
        matches!(self.state(), GuardState::Armed | GuardState::Running)
    }

    /// Arm (or re-arm) the deadline `limit` from now.
    pub fn timeout(&self, limit: Duration) {
        let mut inner = self.inner.borrow_mut();
        if inner.outcome.is_some() || inner.finalizing {
            return;
        }

        let state = inner.state;
        match state {
            GuardState::Completed | GuardState::TimedOut => {
                debug!("{}: timeout ignored in state {:?}", self.selector, state);
                return;
            }
            GuardState::Idle => inner.state = GuardState::Armed,
            GuardState::Armed | GuardState::Running => {}
        }

        if let Some(timer) = inner.pending_timer.take() {
            self.clock.cancel(timer);
        }

        inner.generation += 1;
        let generation = inner.generation;
        let limit_ms = duration_ms(limit);
        inner.limit_ms = limit_ms;
        inner.deadline = Some(self.clock.now_ms().saturating_add(limit_ms));

        let guard = self.clone();
        let timer = self.clock.schedule(
            limit,
            Box::new(move || guard.deadline_elapsed(generation)),
        );
        inner.pending_timer = Some(timer);

        debug!("{}: deadline armed for {}ms", self.selector, limit_ms);
    }

    /// Wrap `body` as a continuation of this test.
    ///
    /// Fails while no deadline is armed.
    pub fn async_(
        &self,
        body: impl FnOnce(&AsyncGuard) -> StepResult + 'static,
    ) -> Result<AsyncHandle, ConfigurationError> {
        {
            let mut inner = self.inner.borrow_mut();
            let state = inner.state;
            match state {
                GuardState::Idle => return Err(ConfigurationError::NotAsync { operation: "async" }),
                GuardState::Armed => inner.state = GuardState::Running,
                GuardState::Running | GuardState::Completed | GuardState::TimedOut => {}
            }
        }

        Ok(AsyncHandle {
            guard: self.clone(),
            body: Box::new(body),
        })
    }

    /// Completion signal.
    ///
    /// Cancels the deadline. Fails while no deadline is armed; a no-op once
    /// the test already completed or timed out.
    pub fn finished(&self) -> Result<(), ConfigurationError> {
        let conclude = {
            let mut inner = self.inner.borrow_mut();
            let state = inner.state;
            match state {
                GuardState::Idle => {
                    return Err(ConfigurationError::NotAsync {
                        operation: "finished",
                    })
                }
                GuardState::Completed | GuardState::TimedOut => return Ok(()),
                GuardState::Armed | GuardState::Running => {}
            }

            inner.state = GuardState::Completed;
            if let Some(timer) = inner.pending_timer.take() {
                self.clock.cancel(timer);
            }
            inner.depth == 0 && inner.outcome.is_none() && !inner.finalizing
        };

        debug!("{}: finished", self.selector);
        if conclude {
            self.conclude();
        }
        Ok(())
    }

    /// Run the primary body segment
    pub fn run(&self, body: impl FnOnce(&AsyncGuard) -> StepResult) {
        debug!("{}: started", self.selector);
        self.execute(body);
    }

    /// Run one segment (body or continuation) under this guard's fault
    /// handling.
    pub(crate) fn execute(&self, segment: impl FnOnce(&AsyncGuard) -> StepResult) {
        let live = {
            let mut inner = self.inner.borrow_mut();
            let live = inner.outcome.is_none() && !inner.finalizing;
            if live {
                inner.depth += 1;
            }
            live
        };

        let result = guarded(|| segment(self));

        if !live {
            if let Err(fault) = result {
                debug!("{}: fault after resolution ignored: {}", self.selector, fault);
            }
            return;
        }

        let conclude = {
            let mut inner = self.inner.borrow_mut();
            inner.depth -= 1;

            if let Err(fault) = result {
                debug!("{}: fault recorded: {}", self.selector, fault);
                if inner.fault.is_none() {
                    inner.fault = Some(fault);
                }
                if matches!(inner.state, GuardState::Armed | GuardState::Running) {
                    inner.state = GuardState::Completed;
                    if let Some(timer) = inner.pending_timer.take() {
                        self.clock.cancel(timer);
                    }
                }
            }

            inner.depth == 0
                && inner.outcome.is_none()
                && !inner.finalizing
                && !matches!(inner.state, GuardState::Armed | GuardState::Running)
        };

        if conclude {
            self.conclude();
        }
    }

    fn deadline_elapsed(&self, generation: u64) {
        let conclude = {
            let mut inner = self.inner.borrow_mut();
            if inner.generation != generation
                || inner.outcome.is_some()
                || inner.finalizing
                || !matches!(inner.state, GuardState::Armed | GuardState::Running)
            {
                return;
            }
            inner.state = GuardState::TimedOut;
            inner.pending_timer = None;
            inner.depth == 0
        };

        debug!("{}: deadline exceeded", self.selector);
        if conclude {
            self.conclude();
        }
    }

    /// Decide the outcome, run tearDown and hand out the record.
    fn conclude(&self) {
        let (state, fault, tear_down, limit_ms) = {
            let mut inner = self.inner.borrow_mut();
            if inner.outcome.is_some() || inner.finalizing {
                return;
            }
            inner.finalizing = true;
            if let Some(timer) = inner.pending_timer.take() {
                self.clock.cancel(timer);
            }
            (
                inner.state,
                inner.fault.take(),
                inner.tear_down.take(),
                inner.limit_ms,
            )
        };

        let (mut outcome, mut detail) = match (state, fault) {
            (GuardState::TimedOut, _) => (
                TestOutcome::TimedOut,
                Some(format!("deadline exceeded after {limit_ms}ms")),
            ),
            (_, Some(Fault::Assertion(message))) => (TestOutcome::Failed, Some(message)),
            (_, Some(Fault::Error(message))) => (TestOutcome::Errored, Some(message)),
            (_, None) => (TestOutcome::Passed, None),
        };

        if let Some(tear_down) = tear_down {
            if let Err(fault) = guarded(|| tear_down(self)) {
                warn!("{}: tearDown raised: {}", self.selector, fault);
                // a tearDown fault after completion is a failure, never an error
                if outcome == TestOutcome::Passed {
                    outcome = TestOutcome::Failed;
                    detail = Some(format!("tearDown: {fault}"));
                }
            }
        }

        let (record, on_resolve) = {
            let mut inner = self.inner.borrow_mut();
            inner.outcome = Some(outcome);
            inner.finalizing = false;

            let elapsed = self.clock.now_ms().saturating_sub(inner.started_at);
            let mut record = TestRecord::new(self.selector(), outcome).with_elapsed_ms(elapsed);
            record.detail = detail;
            (record, inner.on_resolve.take())
        };

        debug!("{}", record);
        if let Some(on_resolve) = on_resolve {
            on_resolve(record);
        }
    }
}

impl fmt::Debug for AsyncGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AsyncGuard")
            .field("selector", &self.selector)
            .field("state", &inner.state)
            .field("deadline", &inner.deadline)
            .field("outcome", &inner.outcome)
            .finish_non_exhaustive()
    }
}

/// Deferred continuation returned by [`AsyncGuard::async_`]
#[must_use = "a continuation does nothing until scheduled or invoked"]
pub struct AsyncHandle {
    guard: AsyncGuard,
    body: Continuation,
}

impl AsyncHandle {
    /// Run the continuation once `delay` has elapsed on the test's clock
    pub fn value_with_timeout(self, delay: Duration) -> TimerHandle {
        let clock = self.guard.clock();
        clock.schedule(delay, Box::new(move || self.value()))
    }

    /// Run the continuation now
    pub fn value(self) {
        let AsyncHandle { guard, body } = self;
        guard.execute(body);
    }
}

impl fmt::Debug for AsyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncHandle")
            .field("selector", &self.guard.selector())
            .finish_non_exhaustive()
    }
}

/// Run `f`, turning a panic into an uncaught error
fn guarded(f: impl FnOnce() -> StepResult) -> StepResult {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Fault::from_panic(payload)),
    }
}
