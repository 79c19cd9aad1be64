//! Time source seam for freshness math.

use chrono::{DateTime, Duration, Utc};

/// Time source used by the freshness evaluator.
///
/// The evaluator only ever asks "how long ago was this instant", so the seam
/// is a single method. Tests install a fixed clock to pin the math; the
/// default measures against the system clock.
pub trait Clock: Send + Sync {
    /// Elapsed time between `earlier` and now.
    fn since(&self, earlier: DateTime<Utc>) -> Duration;
}

/// Default [`Clock`] backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn since(&self, earlier: DateTime<Utc>) -> Duration {
        Utc::now().signed_duration_since(earlier)
    }
}
