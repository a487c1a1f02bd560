//! Result snapshots
//!
//! Serializable copy of a suite result with per-outcome counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{TestOutcome, TestRecord};

/// Summary of a suite run at one point in time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub suite: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub timed_out: usize,
    pub pending: usize,
    pub complete: bool,
    /// Longest elapsed time of any resolved test
    pub duration_ms: u64,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<TestRecord>,
}

impl ResultSnapshot {
    pub fn new(
        suite: impl Into<String>,
        records: Vec<TestRecord>,
        pending: usize,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let count = |outcome: TestOutcome| records.iter().filter(|r| r.outcome == outcome).count();
        let passed = count(TestOutcome::Passed);
        let failed = count(TestOutcome::Failed);
        let errors = count(TestOutcome::Errored);
        let timed_out = count(TestOutcome::TimedOut);
        let duration_ms = records.iter().map(|r| r.elapsed_ms).max().unwrap_or(0);

        Self {
            suite: suite.into(),
            total: records.len() + pending,
            passed,
            failed,
            errors,
            timed_out,
            pending,
            complete: pending == 0,
            duration_ms,
            generated_at,
            records,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.complete && self.passed == self.total
    }

    /// Failures in the suite-result sense: assertion failures and timeouts
    pub fn failure_count(&self) -> usize {
        self.failed + self.timed_out
    }

    /// Records sorted by selector
    pub fn sorted_records(&self) -> Vec<&TestRecord> {
        let mut records: Vec<_> = self.records.iter().collect();
        records.sort_by(|a, b| a.selector.cmp(&b.selector));
        records
    }
}

impl fmt::Display for ResultSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Suite {}", self.suite)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for record in &self.records {
            writeln!(f, "  {record}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Error: {} | Timeout: {} | Pending: {}",
            self.total, self.passed, self.failed, self.errors, self.timed_out, self.pending
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ResultSnapshot {
        let records = vec![
            TestRecord::passed("testPass").with_elapsed_ms(5),
            TestRecord::timed_out("fakeTimeout", "deadline exceeded after 5ms").with_elapsed_ms(5),
            TestRecord::failed("fakeFailure", "assertion was false").with_elapsed_ms(5),
            TestRecord::errored("fakeError", "Intentional").with_elapsed_ms(15),
        ];
        ResultSnapshot::new("SUnitAsyncTest", records, 0, Utc::now())
    }

    #[test]
    fn test_snapshot_counts() {
        let snapshot = snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.passed, 1);
        assert_eq!(snapshot.failure_count(), 2);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.duration_ms, 15);
        assert!(snapshot.complete);
        assert!(!snapshot.is_all_passed());
        assert_eq!(snapshot.pass_rate(), 25.0);
    }

    #[test]
    fn test_sorted_records() {
        let snapshot = snapshot();
        let selectors: Vec<_> = snapshot
            .sorted_records()
            .iter()
            .map(|r| r.selector.as_str())
            .collect();
        assert_eq!(
            selectors,
            vec!["fakeError", "fakeFailure", "fakeTimeout", "testPass"]
        );
    }

    #[test]
    fn test_display_lists_records() {
        let text = snapshot().to_string();
        assert!(text.contains("Suite SUnitAsyncTest"));
        assert!(text.contains("Timeout: 1"));
    }
}
