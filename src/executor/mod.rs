//! Test execution engine
//!
//! Per-test guards, the suite runner and the harness driving suites on a
//! clock.

mod assertions;
mod guard;
mod harness;
mod runner;

pub use guard::{AsyncGuard, AsyncHandle, GuardState};
pub use harness::{Harness, DEFAULT_HARNESS_TIMEOUT};
pub use runner::SuiteRunner;
