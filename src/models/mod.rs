//! Data models for asynchronous test runs
//!
//! Suite definitions and the outcome records produced by running them.

mod suite;
mod test_result;

pub use suite::{Hook, Suite, TestBody, TestCase};
pub use test_result::{TestOutcome, TestRecord};
