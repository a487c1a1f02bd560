//! Built-in test suites
//!
//! ## Suites
//!
//! - `async` - tests of the asynchronous machinery, some running nested suites
//! - `fakes` - every deliberately misbehaving test plus `testPass`
//! - `timeouts` - the deadline subset of `fakes`
//! - `errors` - the error and failure subset of `fakes`
//! - `example-set` - plain synchronous tests

mod example_set;
mod fakes;
mod self_check;

use crate::error::ConfigurationError;
use crate::models::Suite;

/// Selectors of the deadline-related fakes
pub const TIMEOUT_SELECTORS: [&str; 4] = [
    "fakeTimeout",
    "fakeMultipleTimeoutFailing",
    "fakeMultipleTimeoutPassing",
    "testPass",
];

/// Selectors of the error and failure fakes
pub const ERROR_SELECTORS: [&str; 4] = [
    "fakeError",
    "fakeErrorFailingInTearDown",
    "fakeFailure",
    "testPass",
];

/// A named suite the CLI can run
#[derive(Clone, Copy, Debug)]
pub struct BuiltinSuite {
    pub name: &'static str,
    pub description: &'static str,
    build: fn() -> Result<Suite, ConfigurationError>,
}

impl BuiltinSuite {
    pub fn build(&self) -> Result<Suite, ConfigurationError> {
        (self.build)()
    }
}

pub fn fakes_suite() -> Suite {
    fakes::suite()
}

pub fn timeouts_suite() -> Result<Suite, ConfigurationError> {
    fakes::suite().select(&TIMEOUT_SELECTORS)
}

pub fn errors_and_failures_suite() -> Result<Suite, ConfigurationError> {
    fakes::suite().select(&ERROR_SELECTORS)
}

pub fn async_suite() -> Suite {
    self_check::suite()
}

pub fn example_set_suite() -> Suite {
    example_set::suite()
}

/// Every built-in suite, in listing order
pub fn builtin_suites() -> Vec<BuiltinSuite> {
    vec![
        BuiltinSuite {
            name: "async",
            description: "Self-tests of timeouts, continuations and nested suite runs",
            build: || Ok(async_suite()),
        },
        BuiltinSuite {
            name: "fakes",
            description: "Deliberately failing, erroring and hanging tests",
            build: || Ok(fakes_suite()),
        },
        BuiltinSuite {
            name: "timeouts",
            description: "Deadline handling subset of the fakes",
            build: timeouts_suite,
        },
        BuiltinSuite {
            name: "errors",
            description: "Error and failure subset of the fakes",
            build: errors_and_failures_suite,
        },
        BuiltinSuite {
            name: "example-set",
            description: "Synchronous set tests",
            build: || Ok(example_set_suite()),
        },
    ]
}

/// Look up a built-in suite by name (case-insensitive)
pub fn find_suite(name: &str) -> Option<BuiltinSuite> {
    builtin_suites()
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}
