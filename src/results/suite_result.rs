//! Live suite result
//!
//! Shared by the runner (single writer) and any number of readers such as
//! announcement subscribers.

use chrono::Utc;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::ResultSnapshot;
use crate::error::ResultError;
use crate::models::{TestOutcome, TestRecord};

struct ResultState {
    suite: String,
    selectors: Vec<String>,
    records: Vec<TestRecord>,
    recorded: HashSet<String>,
}

/// Append-only outcome collection for one suite run.
///
/// Cloning yields another handle to the same live result.
#[derive(Clone)]
pub struct SuiteResult {
    inner: Rc<RefCell<ResultState>>,
}

impl SuiteResult {
    /// Empty result bound to the given suite selectors
    pub fn new(suite: impl Into<String>, selectors: Vec<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ResultState {
                suite: suite.into(),
                selectors,
                records: Vec::new(),
                recorded: HashSet::new(),
            })),
        }
    }

    /// Store a terminal record. Each suite test is recorded at most once.
    pub fn record(&self, record: TestRecord) -> Result<(), ResultError> {
        let mut state = self.inner.borrow_mut();
        if !state.selectors.iter().any(|s| *s == record.selector) {
            return Err(ResultError::UnknownTest(record.selector));
        }
        if !state.recorded.insert(record.selector.clone()) {
            return Err(ResultError::AlreadyRecorded(record.selector));
        }
        state.records.push(record);
        Ok(())
    }

    fn selectors_where(&self, predicate: impl Fn(TestOutcome) -> bool) -> Vec<String> {
        self.inner
            .borrow()
            .records
            .iter()
            .filter(|r| predicate(r.outcome))
            .map(|r| r.selector.clone())
            .collect()
    }

    /// Selectors that failed an assertion or timed out, in resolution order
    pub fn failures(&self) -> Vec<String> {
        self.selectors_where(|o| o.is_failure())
    }

    /// Selectors that raised an uncaught error, in resolution order
    pub fn errors(&self) -> Vec<String> {
        self.selectors_where(|o| o.is_error())
    }

    pub fn passed(&self) -> Vec<String> {
        self.selectors_where(|o| o.is_success())
    }

    /// Suite selectors without a record yet, in enumeration order
    pub fn pending(&self) -> Vec<String> {
        let state = self.inner.borrow();
        state
            .selectors
            .iter()
            .filter(|s| !state.recorded.contains(s.as_str()))
            .cloned()
            .collect()
    }

    /// Every suite test has a record
    pub fn is_complete(&self) -> bool {
        let state = self.inner.borrow();
        state.recorded.len() == state.selectors.len()
    }

    pub fn outcome_of(&self, selector: &str) -> Option<TestOutcome> {
        self.inner
            .borrow()
            .records
            .iter()
            .find(|r| r.selector == selector)
            .map(|r| r.outcome)
    }

    pub fn records(&self) -> Vec<TestRecord> {
        self.inner.borrow().records.clone()
    }

    /// Number of recorded tests
    pub fn len(&self) -> usize {
        self.inner.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tests in the suite
    pub fn total(&self) -> usize {
        self.inner.borrow().selectors.len()
    }

    pub fn suite_name(&self) -> String {
        self.inner.borrow().suite.clone()
    }

    /// Point-in-time copy for reporting
    pub fn snapshot(&self) -> ResultSnapshot {
        let state = self.inner.borrow();
        let pending = state.selectors.len() - state.recorded.len();
        ResultSnapshot::new(&state.suite, state.records.clone(), pending, Utc::now())
    }
}

impl fmt::Debug for SuiteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("SuiteResult")
            .field("suite", &state.suite)
            .field("total", &state.selectors.len())
            .field("records", &state.records)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> SuiteResult {
        SuiteResult::new(
            "Sample",
            vec![
                "testA".to_string(),
                "testB".to_string(),
                "testC".to_string(),
                "testD".to_string(),
            ],
        )
    }

    #[test]
    fn test_derived_queries() {
        let result = result();
        result.record(TestRecord::timed_out("testC", "late")).unwrap();
        result.record(TestRecord::errored("testB", "boom")).unwrap();
        result.record(TestRecord::failed("testA", "false")).unwrap();

        assert_eq!(result.failures(), vec!["testC", "testA"]);
        assert_eq!(result.errors(), vec!["testB"]);
        assert_eq!(result.pending(), vec!["testD"]);
        assert!(!result.is_complete());

        result.record(TestRecord::passed("testD")).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.passed(), vec!["testD"]);
        assert_eq!(result.outcome_of("testB"), Some(TestOutcome::Errored));
    }

    #[test]
    fn test_record_rejects_duplicates_and_strangers() {
        let result = result();
        result.record(TestRecord::passed("testA")).unwrap();

        assert_eq!(
            result.record(TestRecord::failed("testA", "again")),
            Err(ResultError::AlreadyRecorded("testA".to_string()))
        );
        assert_eq!(
            result.record(TestRecord::passed("testZ")),
            Err(ResultError::UnknownTest("testZ".to_string()))
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.outcome_of("testA"), Some(TestOutcome::Passed));
    }

    #[test]
    fn test_clones_share_state() {
        let result = result();
        let reader = result.clone();
        result.record(TestRecord::passed("testA")).unwrap();
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.total(), 4);
    }

    #[test]
    fn test_snapshot_counts() {
        let result = result();
        result.record(TestRecord::passed("testA")).unwrap();
        result.record(TestRecord::timed_out("testB", "late")).unwrap();

        let snapshot = result.snapshot();
        assert_eq!(snapshot.suite, "Sample");
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.passed, 1);
        assert_eq!(snapshot.timed_out, 1);
        assert_eq!(snapshot.pending, 2);
        assert!(!snapshot.complete);
    }
}
