//! Suite result aggregation
//!
//! The live, append-only result of a suite run and serializable snapshots
//! of it for reporting.

mod snapshot;
mod suite_result;

pub use snapshot::ResultSnapshot;
pub use suite_result::SuiteResult;
