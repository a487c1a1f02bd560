//! Assertion signalling helpers
//!
//! Thin wrappers turning checks into [`Fault`]s so bodies can use `?`.

use std::fmt;

use super::AsyncGuard;
use crate::error::{Fault, StepResult};

impl AsyncGuard {
    pub fn assert(&self, condition: bool) -> StepResult {
        self.assert_that(condition, "assertion was false")
    }

    pub fn assert_that(&self, condition: bool, description: impl Into<String>) -> StepResult {
        if condition {
            Ok(())
        } else {
            Err(Fault::assertion(description))
        }
    }

    pub fn deny(&self, condition: bool) -> StepResult {
        self.assert_that(!condition, "denial was true")
    }

    pub fn assert_equals<T: PartialEq + fmt::Debug>(&self, expected: T, actual: T) -> StepResult {
        if expected == actual {
            Ok(())
        } else {
            Err(Fault::assertion(format!(
                "expected {expected:?} but got {actual:?}"
            )))
        }
    }

    /// Raise an uncaught error from the test
    pub fn error(&self, message: impl Into<String>) -> StepResult {
        Err(Fault::error(message))
    }

    /// Fail unless `operation` returns an error
    pub fn should_raise<T, E>(&self, operation: impl FnOnce() -> Result<T, E>) -> StepResult {
        match operation() {
            Ok(_) => Err(Fault::assertion("expected an error to be raised")),
            Err(_) => Ok(()),
        }
    }

    /// Fail if `operation` returns an error
    pub fn shouldnt_raise<T, E: fmt::Display>(
        &self,
        operation: impl FnOnce() -> Result<T, E>,
    ) -> StepResult {
        match operation() {
            Ok(_) => Ok(()),
            Err(err) => Err(Fault::assertion(format!("unexpected error: {err}"))),
        }
    }
}
