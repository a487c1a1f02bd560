//! Test outcome models
//!
//! Defines terminal outcomes and the per-test record kept by a suite result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of one test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed,
    Errored,
    TimedOut,
}

impl TestOutcome {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestOutcome::Passed => "✓",
            TestOutcome::Failed => "✗",
            TestOutcome::Errored => "!",
            TestOutcome::TimedOut => "⧗",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    /// Assertion failures and timeouts both count as failures
    pub fn is_failure(&self) -> bool {
        matches!(self, TestOutcome::Failed | TestOutcome::TimedOut)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TestOutcome::Errored)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "PASS"),
            TestOutcome::Failed => write!(f, "FAIL"),
            TestOutcome::Errored => write!(f, "ERROR"),
            TestOutcome::TimedOut => write!(f, "TIMEOUT"),
        }
    }
}

/// Resolved outcome of a single test
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub selector: String,
    pub outcome: TestOutcome,
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

impl TestRecord {
    pub fn new(selector: impl Into<String>, outcome: TestOutcome) -> Self {
        Self {
            selector: selector.into(),
            outcome,
            detail: None,
            elapsed_ms: 0,
        }
    }

    pub fn passed(selector: impl Into<String>) -> Self {
        Self::new(selector, TestOutcome::Passed)
    }

    pub fn failed(selector: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(selector, TestOutcome::Failed).with_detail(detail)
    }

    pub fn errored(selector: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(selector, TestOutcome::Errored).with_detail(detail)
    }

    pub fn timed_out(selector: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(selector, TestOutcome::TimedOut).with_detail(detail)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }
}

impl fmt::Display for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}ms]",
            self.outcome.symbol(),
            self.outcome,
            self.selector,
            self.elapsed_ms
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " - {detail}")?;
        }
        Ok(())
    }
}
