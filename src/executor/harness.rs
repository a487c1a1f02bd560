//! Suite harness
//!
//! Runs a suite to completion (or until the harness deadline) on either the
//! virtual clock or real tokio timers and returns a snapshot of the result.

use anyhow::{Context, Result};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::LocalSet;
use tracing::{info, warn};

use super::SuiteRunner;
use crate::announce::AnnouncementKind;
use crate::clock::{ClockKind, ManualClock, RuntimeClock};
use crate::models::Suite;
use crate::results::ResultSnapshot;

/// Default overall deadline for a suite run
pub const DEFAULT_HARNESS_TIMEOUT: Duration = Duration::from_millis(200);

/// Drives suites to completion
#[derive(Clone, Copy, Debug)]
pub struct Harness {
    clock: ClockKind,
    timeout: Duration,
}

impl Harness {
    pub fn new(clock: ClockKind) -> Self {
        Self {
            clock,
            timeout: DEFAULT_HARNESS_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn clock(&self) -> ClockKind {
        self.clock
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `suite` and snapshot its result once complete or timed out
    pub fn run(&self, suite: Suite) -> Result<ResultSnapshot> {
        info!(
            "Running suite {} on the {} clock (harness deadline {}ms)",
            suite.name(),
            self.clock,
            self.timeout.as_millis()
        );

        let start = Instant::now();
        let snapshot = match self.clock {
            ClockKind::Manual => self.run_manual(suite)?,
            ClockKind::Runtime => self.run_runtime(suite)?,
        };

        if snapshot.complete {
            info!(
                "Suite {} finished in {}ms wall time",
                snapshot.suite,
                start.elapsed().as_millis()
            );
        } else {
            warn!(
                "Harness deadline reached with {} of {} tests unresolved",
                snapshot.pending, snapshot.total
            );
        }

        Ok(snapshot)
    }

    fn run_manual(&self, suite: Suite) -> Result<ResultSnapshot> {
        let clock = Rc::new(ManualClock::new());
        let runner = SuiteRunner::on(suite, clock.clone())?;
        let result = runner.result();

        runner.run()?;
        clock.run_until(self.timeout, || result.is_complete());

        Ok(result.snapshot())
    }

    fn run_runtime(&self, suite: Suite) -> Result<ResultSnapshot> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("Failed to build tokio runtime")?;

        LocalSet::new().block_on(&runtime, drive_on_runtime(suite, self.timeout))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(ClockKind::Manual)
    }
}

async fn drive_on_runtime(suite: Suite, timeout: Duration) -> Result<ResultSnapshot> {
    let clock = Rc::new(RuntimeClock::new());
    let runner = SuiteRunner::on(suite, clock)?;
    let result = runner.result();
    let done = Rc::new(Notify::new());

    let notify = Rc::clone(&done);
    runner
        .announcer()
        .on(AnnouncementKind::Result, move |announcement| {
            if announcement.result().is_complete() {
                notify.notify_one();
            }
        });

    runner.run()?;

    if !result.is_complete() && tokio::time::timeout(timeout, done.notified()).await.is_err() {
        warn!(
            "Suite {} did not complete within {}ms",
            runner.suite().name(),
            timeout.as_millis()
        );
    }

    Ok(result.snapshot())
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::fixtures;

    fn sorted(mut selectors: Vec<String>) -> Vec<String> {
        selectors.sort();
        selectors
    }

    #[test]
    fn test_harness_defaults() {
        let harness = Harness::default();
        assert_eq!(harness.clock(), ClockKind::Manual);
        assert_eq!(harness.timeout(), Duration::from_millis(200));
    }

    #[test]
    fn test_manual_harness_times_out_hanging_suite() {
        let suite = Suite::new("Hanging").with_test("testNeverFinishes", |t| {
            t.timeout(Duration::from_millis(1_000));
            Ok(())
        });

        let snapshot = Harness::new(ClockKind::Manual).run(suite).unwrap();
        assert!(!snapshot.complete);
        assert_eq!(snapshot.pending, 1);
    }

    #[test]
    fn test_manual_harness_runs_timeouts_suite() {
        let snapshot = Harness::new(ClockKind::Manual)
            .run(fixtures::timeouts_suite().unwrap())
            .unwrap();

        assert!(snapshot.complete);
        let failures: Vec<String> = snapshot
            .records
            .iter()
            .filter(|r| r.outcome.is_failure())
            .map(|r| r.selector.clone())
            .collect();
        assert_eq!(
            sorted(failures),
            vec!["fakeMultipleTimeoutFailing", "fakeTimeout"]
        );
    }

    #[test]
    fn test_runtime_harness_runs_errors_suite() {
        let snapshot = Harness::new(ClockKind::Runtime)
            .with_timeout(Duration::from_secs(5))
            .run(fixtures::errors_and_failures_suite().unwrap())
            .unwrap();

        assert!(snapshot.complete);
        assert_eq!(snapshot.passed, 1);
        assert_eq!(snapshot.failed, 2);
        assert_eq!(snapshot.errors, 1);
    }
}
