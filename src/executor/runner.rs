//! Suite runner
//!
//! Dispatches every test of a suite through its own guard, records each
//! outcome and announces progress after every resolution.

use std::cell::Cell;
use std::rc::Rc;
use tracing::{error, info};

use super::AsyncGuard;
use crate::announce::{Announcement, Announcer};
use crate::clock::Clock;
use crate::error::ConfigurationError;
use crate::models::{Suite, TestCase, TestRecord};
use crate::results::SuiteResult;

/// Runs one suite on a clock
pub struct SuiteRunner {
    suite: Suite,
    clock: Rc<dyn Clock>,
    result: SuiteResult,
    announcer: Announcer,
    dispatched: Cell<bool>,
}

impl SuiteRunner {
    /// Create a runner for `suite`
    pub fn on(suite: Suite, clock: Rc<dyn Clock>) -> Result<Self, ConfigurationError> {
        suite.validate()?;
        let result = SuiteResult::new(suite.name(), suite.selectors());

        Ok(Self {
            suite,
            clock,
            result,
            announcer: Announcer::new(),
            dispatched: Cell::new(false),
        })
    }

    /// The live result; empty until tests start resolving
    pub fn result(&self) -> SuiteResult {
        self.result.clone()
    }

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    pub fn suite(&self) -> &Suite {
        &self.suite
    }

    /// Start every test in enumeration order.
    ///
    /// Returns once each body has run its synchronous part; asynchronous
    /// tests resolve later as the clock fires their timers.
    pub fn run(&self) -> Result<(), ConfigurationError> {
        if self.dispatched.replace(true) {
            return Err(ConfigurationError::AlreadyRun);
        }

        info!(
            "Starting suite {} ({} tests)",
            self.suite.name(),
            self.suite.len()
        );

        for case in self.suite.cases() {
            self.dispatch(case);
        }

        Ok(())
    }

    fn dispatch(&self, case: &TestCase) {
        let result = self.result.clone();
        let announcer = self.announcer.clone();
        let suite_name = self.suite.name().to_string();

        let mut guard = AsyncGuard::new(case.selector(), Rc::clone(&self.clock))
            .on_resolve(move |record| resolve(&suite_name, &result, &announcer, record));
        if let Some(tear_down) = self.suite.tear_down() {
            guard = guard.with_tear_down(tear_down);
        }

        let set_up = self.suite.set_up();
        let body = case.body();
        guard.run(move |t| {
            if let Some(set_up) = set_up {
                set_up(t)?;
            }
            body(t)
        });
    }
}

/// Record a resolved test and announce it
fn resolve(suite: &str, result: &SuiteResult, announcer: &Announcer, record: TestRecord) {
    let selector = record.selector.clone();
    info!("  {}", record);

    if let Err(e) = result.record(record) {
        error!("Dropping record for {}: {}", selector, e);
        return;
    }

    if result.is_complete() {
        let snapshot = result.snapshot();
        info!(
            "Suite {} completed - Pass: {}/{} ({:.1}%)",
            suite,
            snapshot.passed,
            snapshot.total,
            snapshot.pass_rate()
        );
    }

    announcer.publish(&Announcement::resolved(selector, result.clone()));
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::announce::AnnouncementKind;
    use crate::clock::ManualClock;
    use crate::models::TestOutcome;
    use std::cell::RefCell;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn mixed_suite() -> Suite {
        Suite::new("Mixed")
            .with_test("testSlow", |t| {
                t.timeout(ms(50));
                t.async_(|t| Ok(t.finished()?))?.value_with_timeout(ms(20));
                Ok(())
            })
            .with_test("testSync", |t| t.assert(true))
            .with_test("testFast", |t| {
                t.timeout(ms(50));
                t.async_(|t| Ok(t.finished()?))?.value_with_timeout(ms(5));
                Ok(())
            })
    }

    #[test]
    fn test_runner_rejects_empty_suite() {
        let clock = Rc::new(ManualClock::new());
        assert!(matches!(
            SuiteRunner::on(Suite::new("Empty"), clock),
            Err(ConfigurationError::EmptySuite(_))
        ));
    }

    #[test]
    fn test_result_available_before_run() {
        let clock = Rc::new(ManualClock::new());
        let runner = SuiteRunner::on(mixed_suite(), clock).unwrap();
        let result = runner.result();
        assert!(result.is_empty());
        assert!(!result.is_complete());
        assert_eq!(result.total(), 3);
    }

    #[test]
    fn test_resolution_order_follows_timers() {
        let clock = Rc::new(ManualClock::new());
        let runner = SuiteRunner::on(mixed_suite(), clock.clone()).unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&order);
        runner.announcer().on(AnnouncementKind::Result, move |ann| {
            sink.borrow_mut().push(ann.selector().to_string());
        });

        runner.run().unwrap();
        assert_eq!(*order.borrow(), vec!["testSync"]);

        clock.run_until_idle();
        assert_eq!(*order.borrow(), vec!["testSync", "testFast", "testSlow"]);
        assert!(runner.result().is_complete());
    }

    #[test]
    fn test_one_announcement_per_test_and_only_last_is_complete() {
        let clock = Rc::new(ManualClock::new());
        let runner = SuiteRunner::on(mixed_suite(), clock.clone()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        runner.announcer().on(AnnouncementKind::Result, move |ann| {
            sink.borrow_mut().push(ann.result().is_complete());
        });

        runner.run().unwrap();
        clock.run_until_idle();

        assert_eq!(*seen.borrow(), vec![false, false, true]);
    }

    #[test]
    fn test_run_twice_is_rejected() {
        let clock = Rc::new(ManualClock::new());
        let runner = SuiteRunner::on(mixed_suite(), clock).unwrap();
        runner.run().unwrap();
        assert_eq!(runner.run(), Err(ConfigurationError::AlreadyRun));
    }

    #[test]
    fn test_set_up_faults_are_errors() {
        let clock = Rc::new(ManualClock::new());
        let suite = Suite::new("BrokenSetUp")
            .with_set_up(|t| t.error("no fixture"))
            .with_test("testNeverReached", |t| t.assert(false));
        let runner = SuiteRunner::on(suite, clock).unwrap();

        runner.run().unwrap();

        let result = runner.result();
        assert_eq!(result.errors(), vec!["testNeverReached"]);
        assert!(result.failures().is_empty());
    }

    #[test]
    fn test_double_completion_records_once() {
        let clock = Rc::new(ManualClock::new());
        let suite = Suite::new("Twice").with_test("testTwice", |t| {
            t.timeout(ms(10));
            t.async_(|t| {
                t.finished()?;
                Ok(t.finished()?)
            })?
            .value_with_timeout(ms(1));
            t.async_(|t| Ok(t.finished()?))?.value_with_timeout(ms(2));
            Ok(())
        });
        let runner = SuiteRunner::on(suite, clock.clone()).unwrap();
        let announcements = Rc::new(Cell::new(0));

        let counter = Rc::clone(&announcements);
        runner
            .announcer()
            .on(AnnouncementKind::Result, move |_| counter.set(counter.get() + 1));

        runner.run().unwrap();
        clock.run_until_idle();

        assert_eq!(announcements.get(), 1);
        assert_eq!(runner.result().len(), 1);
        assert_eq!(
            runner.result().outcome_of("testTwice"),
            Some(TestOutcome::Passed)
        );
    }

    #[test]
    fn test_usage_fault_in_body_registers_no_extra_record() {
        let clock = Rc::new(ManualClock::new());
        let suite = Suite::new("Usage").with_test("testFinishedWithoutTimeout", |t| {
            let err = t.finished().unwrap_err();
            t.assert_equals(
                ConfigurationError::NotAsync {
                    operation: "finished",
                },
                err,
            )
        });
        let runner = SuiteRunner::on(suite, clock).unwrap();

        runner.run().unwrap();

        assert_eq!(runner.result().len(), 1);
        assert_eq!(runner.result().passed(), vec!["testFinishedWithoutTimeout"]);
    }
}
