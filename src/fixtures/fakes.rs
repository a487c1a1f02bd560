//! Deliberately misbehaving asynchronous tests
//!
//! Each `fake*` test ends in a known non-passing outcome; `testPass` is the
//! well-behaved control.

use std::time::Duration;

use crate::executor::AsyncGuard;
use crate::error::StepResult;
use crate::models::Suite;

pub const SUITE_NAME: &str = "SUnitAsyncTest";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// All fake tests plus `testPass`
pub fn suite() -> Suite {
    Suite::new(SUITE_NAME)
        .with_tear_down(tear_down)
        .with_test("fakeError", fake_error)
        .with_test("fakeErrorFailingInTearDown", fake_error_failing_in_tear_down)
        .with_test("fakeFailure", fake_failure)
        .with_test("fakeMultipleTimeoutFailing", fake_multiple_timeout_failing)
        .with_test("fakeMultipleTimeoutPassing", fake_multiple_timeout_passing)
        .with_test("fakeTimeout", fake_timeout)
        .with_test("testPass", test_pass)
}

fn tear_down(t: &AsyncGuard) -> StepResult {
    if t.selector() == "fakeErrorFailingInTearDown" {
        return t.error("Intentional");
    }
    Ok(())
}

fn fake_error(t: &AsyncGuard) -> StepResult {
    t.timeout(ms(10));
    t.async_(|t| t.error("Intentional"))?
        .value_with_timeout(ms(5));
    Ok(())
}

fn fake_error_failing_in_tear_down(t: &AsyncGuard) -> StepResult {
    t.timeout(ms(10));
    t.async_(|t| Ok(t.finished()?))?
        .value_with_timeout(ms(5));
    Ok(())
}

fn fake_failure(t: &AsyncGuard) -> StepResult {
    t.timeout(ms(10));
    t.async_(|t| t.assert(false))?.value_with_timeout(ms(5));
    Ok(())
}

/// The outer deadline elapses before the nested continuation can re-arm it
fn fake_multiple_timeout_failing(t: &AsyncGuard) -> StepResult {
    t.timeout(ms(5));
    t.async_(|t| {
        t.async_(|_| Ok(()))?.value_with_timeout(ms(10));
        Ok(())
    })?
    .value_with_timeout(ms(5));
    Ok(())
}

/// Re-arms the deadline from a continuation and finishes in time
fn fake_multiple_timeout_passing(t: &AsyncGuard) -> StepResult {
    t.timeout(ms(10));
    t.async_(|t| {
        t.timeout(ms(20));
        t.async_(|t| Ok(t.finished()?))?
            .value_with_timeout(ms(10));
        Ok(())
    })?
    .value_with_timeout(ms(5));
    Ok(())
}

fn fake_timeout(t: &AsyncGuard) -> StepResult {
    t.timeout(ms(5));
    t.async_(|_| Ok(()))?.value_with_timeout(ms(5));
    Ok(())
}

pub(crate) fn test_pass(t: &AsyncGuard) -> StepResult {
    t.timeout(ms(10));
    t.async_(|t| Ok(t.finished()?))?
        .value_with_timeout(ms(5));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::executor::SuiteRunner;
    use crate::models::TestOutcome;
    use std::rc::Rc;

    #[test]
    fn test_each_fake_resolves_as_designed() {
        let clock = Rc::new(ManualClock::new());
        let runner = SuiteRunner::on(suite(), clock.clone()).unwrap();
        runner.run().unwrap();
        clock.run_until_idle();

        let result = runner.result();
        let expect = [
            ("fakeError", TestOutcome::Errored),
            ("fakeErrorFailingInTearDown", TestOutcome::Failed),
            ("fakeFailure", TestOutcome::Failed),
            ("fakeMultipleTimeoutFailing", TestOutcome::TimedOut),
            ("fakeMultipleTimeoutPassing", TestOutcome::Passed),
            ("fakeTimeout", TestOutcome::TimedOut),
            ("testPass", TestOutcome::Passed),
        ];
        for (selector, outcome) in expect {
            assert_eq!(result.outcome_of(selector), Some(outcome), "{selector}");
        }
        assert!(result.is_complete());
    }
}
