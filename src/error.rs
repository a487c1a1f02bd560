//! Error types
//!
//! Usage faults raised synchronously by the engine, the faults a test body
//! signals back to its guard, and result bookkeeping errors.

use std::any::Any;
use thiserror::Error;

/// Programmer-usage faults. Raised synchronously and never classified as a
/// test outcome.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// `async_`/`finished` called before a deadline was armed
    #[error("{operation} requires an armed timeout; call timeout() first")]
    NotAsync { operation: &'static str },

    #[error("suite `{0}` has no tests")]
    EmptySuite(String),

    #[error("suite `{suite}` defines `{selector}` more than once")]
    DuplicateTest { suite: String, selector: String },

    #[error("suite `{suite}` has no test named `{selector}`")]
    UnknownTest { suite: String, selector: String },

    #[error("suite runner has already been run")]
    AlreadyRun,
}

/// Fault signalled by a test body, continuation or hook.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    /// An assertion primitive failed
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// Any other uncaught error
    #[error("{0}")]
    Error(String),
}

impl Fault {
    pub fn assertion(description: impl Into<String>) -> Self {
        Fault::Assertion(description.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Fault::Error(message.into())
    }

    /// Convert a caught panic payload into an uncaught error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        Fault::Error(format!("panicked: {message}"))
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Fault::Assertion(_))
    }
}

impl From<ConfigurationError> for Fault {
    fn from(err: ConfigurationError) -> Self {
        Fault::Error(err.to_string())
    }
}

/// Internal-consistency errors of a suite result.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResultError {
    #[error("test `{0}` already has a recorded outcome")]
    AlreadyRecorded(String),

    #[error("test `{0}` is not part of this suite")]
    UnknownTest(String),
}

/// Outcome of one body segment.
pub type StepResult = Result<(), Fault>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let err = ConfigurationError::NotAsync {
            operation: "finished",
        };
        assert_eq!(
            err.to_string(),
            "finished requires an armed timeout; call timeout() first"
        );
    }

    #[test]
    fn test_fault_from_panic() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        let fault = Fault::from_panic(payload);
        assert_eq!(fault, Fault::Error("panicked: boom".to_string()));
        assert!(!fault.is_assertion());
    }

    #[test]
    fn test_configuration_error_into_fault() {
        let fault: Fault = ConfigurationError::AlreadyRun.into();
        assert!(matches!(fault, Fault::Error(_)));
    }
}
