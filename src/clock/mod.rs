//! Timer abstraction
//!
//! Everything time-driven in the engine goes through [`Clock`], so suites can
//! run against real tokio timers or a deterministic virtual clock.

mod manual;
mod runtime;

pub use manual::ManualClock;
pub use runtime::RuntimeClock;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Callback fired when a timer expires
pub type TimerCallback = Box<dyn FnOnce() + 'static>;

/// Handle identifying a scheduled timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Single-threaded timer source.
///
/// Callbacks run on the thread driving the clock, at or after their delay.
/// Cancelling a handle that already fired or was already cancelled does
/// nothing.
pub trait Clock {
    /// Milliseconds elapsed since the clock was created
    fn now_ms(&self) -> u64;

    /// Run `callback` once `delay` has elapsed
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Prevent a pending callback from firing
    fn cancel(&self, handle: TimerHandle);
}

/// Clock implementation selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// Virtual time, advanced timer by timer
    #[default]
    Manual,
    /// Wall-clock tokio timers
    Runtime,
}

impl ClockKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manual" | "virtual" => Some(ClockKind::Manual),
            "runtime" | "tokio" | "real" => Some(ClockKind::Runtime),
            _ => None,
        }
    }
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockKind::Manual => write!(f, "manual"),
            ClockKind::Runtime => write!(f, "runtime"),
        }
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_kind_from_str() {
        assert_eq!(ClockKind::from_str("manual"), Some(ClockKind::Manual));
        assert_eq!(ClockKind::from_str("Tokio"), Some(ClockKind::Runtime));
        assert_eq!(ClockKind::from_str("sundial"), None);
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(5)), 5);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}
