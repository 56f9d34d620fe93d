//! Wall-clock abstraction for the undo-window deadline.
//!
//! The coordinator never reads the system time directly; it asks the injected
//! [`Clock`]. Tests drive deadlines with a manual clock instead of sleeping.
use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
