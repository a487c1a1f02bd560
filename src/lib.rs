//! sunit-async - deadline-driven asynchronous xUnit test execution
//!
//! Tests run on a single thread against a [`Clock`]. A test that arms a
//! deadline with [`AsyncGuard::timeout`] stays open until it calls
//! [`AsyncGuard::finished`], faults, or its deadline elapses; every
//! resolution is recorded once in the [`SuiteResult`] and announced to
//! subscribers.
//!
//! ```no_run
//! use std::rc::Rc;
//! use std::time::Duration;
//! use sunit_async::{ManualClock, Suite, SuiteRunner};
//!
//! let suite = Suite::new("Example").with_test("testLater", |t| {
//!     t.timeout(Duration::from_millis(10));
//!     t.async_(|t| Ok(t.finished()?))?
//!         .value_with_timeout(Duration::from_millis(5));
//!     Ok(())
//! });
//!
//! let clock = Rc::new(ManualClock::new());
//! let runner = SuiteRunner::on(suite, clock.clone()).unwrap();
//! runner.run().unwrap();
//! clock.run_until_idle();
//! assert!(runner.result().is_complete());
//! ```

pub mod announce;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod fixtures;
pub mod models;
pub mod output;
pub mod results;
pub mod utils;

pub use announce::{Announcement, AnnouncementKind, Announcer};
pub use clock::{Clock, ClockKind, ManualClock, RuntimeClock, TimerHandle};
pub use error::{ConfigurationError, Fault, ResultError, StepResult};
pub use executor::{AsyncGuard, AsyncHandle, GuardState, Harness, SuiteRunner};
pub use models::{Suite, TestCase, TestOutcome, TestRecord};
pub use results::{ResultSnapshot, SuiteResult};
