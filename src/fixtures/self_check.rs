//! Tests of the asynchronous test machinery itself
//!
//! The nested-suite tests start a second runner on the enclosing test's clock
//! and check its result from a continuation fired by the result announcement.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use super::{errors_and_failures_suite, fakes, timeouts_suite};
use crate::announce::AnnouncementKind;
use crate::error::StepResult;
use crate::executor::{AsyncGuard, SuiteRunner};
use crate::models::Suite;
use crate::results::SuiteResult;

pub const SUITE_NAME: &str = "SUnitAsyncSelfTest";

/// Deadline armed by tests that wait on a nested suite
const NESTED_SUITE_TIMEOUT: Duration = Duration::from_millis(200);

pub fn suite() -> Suite {
    Suite::new(SUITE_NAME)
        .with_test("testAsyncErrorsAndFailures", test_async_errors_and_failures)
        .with_test("testAsyncNeedsTimeout", test_async_needs_timeout)
        .with_test("testFinishedNeedsTimeout", test_finished_needs_timeout)
        .with_test(
            "testIsAsyncReturnsCorrectValues",
            test_is_async_returns_correct_values,
        )
        .with_test("testPass", fakes::test_pass)
        .with_test("testTimeouts", test_timeouts)
        .with_test(
            "testTwoAsyncPassesWithFinishedOnlyFirstCounts",
            test_two_async_passes_with_finished_only_first_counts,
        )
}

fn sorted(mut selectors: Vec<String>) -> Vec<String> {
    selectors.sort();
    selectors
}

fn names(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

/// Run `suite` on `t`'s clock and invoke `check` once its result is complete
fn run_nested(
    t: &AsyncGuard,
    suite: Suite,
    check: impl FnOnce(&AsyncGuard, &SuiteResult) -> StepResult + 'static,
) -> StepResult {
    let runner = SuiteRunner::on(suite, t.clock())?;
    t.timeout(NESTED_SUITE_TIMEOUT);

    let observed = runner.result();
    let assert_block = t.async_(move |t| check(t, &observed))?;
    let pending = RefCell::new(Some(assert_block));

    runner
        .announcer()
        .on(AnnouncementKind::Result, move |announcement| {
            if !announcement.result().is_complete() {
                return;
            }
            let block = pending.borrow_mut().take();
            if let Some(block) = block {
                block.value();
            }
        });

    runner.run()?;
    Ok(())
}

fn test_async_errors_and_failures(t: &AsyncGuard) -> StepResult {
    run_nested(t, errors_and_failures_suite()?, |t, result| {
        t.assert_equals(
            names(&["fakeErrorFailingInTearDown", "fakeFailure"]),
            sorted(result.failures()),
        )?;
        t.assert_equals(names(&["fakeError"]), sorted(result.errors()))?;
        Ok(t.finished()?)
    })
}

fn test_async_needs_timeout(t: &AsyncGuard) -> StepResult {
    t.should_raise(|| t.async_(|_| Ok(())).map(drop))?;
    t.timeout(Duration::ZERO);
    t.shouldnt_raise(|| t.async_(|_| Ok(())).map(drop))?;
    Ok(t.finished()?)
}

fn test_finished_needs_timeout(t: &AsyncGuard) -> StepResult {
    t.should_raise(|| t.finished())?;
    t.timeout(Duration::ZERO);
    t.shouldnt_raise(|| t.finished())
}

fn test_is_async_returns_correct_values(t: &AsyncGuard) -> StepResult {
    t.deny(t.is_async())?;
    t.timeout(Duration::ZERO);
    t.assert(t.is_async())?;
    t.finished()?;
    t.deny(t.is_async())
}

fn test_timeouts(t: &AsyncGuard) -> StepResult {
    run_nested(t, timeouts_suite()?, |t, result| {
        t.assert_equals(
            names(&["fakeMultipleTimeoutFailing", "fakeTimeout"]),
            sorted(result.failures()),
        )?;
        t.assert(result.errors().is_empty())?;
        t.assert_equals(
            names(&["fakeMultipleTimeoutPassing", "testPass"]),
            sorted(result.passed()),
        )?;
        Ok(t.finished()?)
    })
}

/// Both continuations run; the second one finds the test already resolved
fn test_two_async_passes_with_finished_only_first_counts(t: &AsyncGuard) -> StepResult {
    t.timeout(Duration::from_millis(10));
    let runs = Rc::new(Cell::new(0u32));

    for _ in 0..2 {
        let runs = Rc::clone(&runs);
        t.async_(move |t| {
            runs.set(runs.get() + 1);
            t.assert_equals(1, runs.get())?;
            Ok(t.finished()?)
        })?
        .value_with_timeout(Duration::ZERO);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::TestOutcome;

    fn run_self_check() -> SuiteResult {
        let clock = Rc::new(ManualClock::new());
        let runner = SuiteRunner::on(suite(), clock.clone()).unwrap();
        runner.run().unwrap();
        clock.run_until_idle();
        runner.result()
    }

    #[test]
    fn test_self_check_suite_passes() {
        let result = run_self_check();
        assert!(result.is_complete());
        assert!(result.failures().is_empty(), "{:?}", result.failures());
        assert!(result.errors().is_empty(), "{:?}", result.errors());
        assert_eq!(result.passed().len(), 7);
    }

    #[test]
    fn test_nested_suites_resolve_before_their_observers() {
        let result = run_self_check();
        assert_eq!(
            result.outcome_of("testTimeouts"),
            Some(TestOutcome::Passed)
        );
        assert_eq!(
            result.outcome_of("testAsyncErrorsAndFailures"),
            Some(TestOutcome::Passed)
        );
    }

    #[test]
    fn test_nested_check_failure_is_reported() {
        let clock = Rc::new(ManualClock::new());
        let suite = Suite::new("Observer").with_test("testWrongExpectation", |t| {
            run_nested(t, timeouts_suite()?, |t, result| {
                t.assert_equals(0, result.failures().len())?;
                Ok(t.finished()?)
            })
        });
        let runner = SuiteRunner::on(suite, clock.clone()).unwrap();
        runner.run().unwrap();
        clock.run_until_idle();

        assert_eq!(
            runner.result().outcome_of("testWrongExpectation"),
            Some(TestOutcome::Failed)
        );
    }
}
