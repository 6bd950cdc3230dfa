//! # Barrier
//!
//! Per-dataset rate-limiting gates.
//!
//! A barrier answers "may this action run now?" and is told when the action
//! actually succeeded. Only confirmed successes move the gate forward.
//!
//! ## Usage Example
//!
//! ```
//! use barrier::{Barrier, TimeDeltaBarrier};
//! use chrono::{TimeDelta, TimeZone, Utc};
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let mut barrier = TimeDeltaBarrier::new(TimeDelta::minutes(5));
//!
//! assert!(barrier.check(t0).is_ok());
//! barrier.success(t0);
//! assert!(barrier.check(t0 + TimeDelta::minutes(1)).is_err());
//! assert!(barrier.check(t0 + TimeDelta::minutes(5)).is_ok());
//! ```

mod set;
mod time_delta;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use set::BarrierSet;
pub use time_delta::TimeDeltaBarrier;

/// The gate refused the action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct BarrierDenied {
    /// Human readable reason
    pub reason: String,
}

impl BarrierDenied {
    /// Create a denial
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Rate-limiting gate with success feedback
pub trait Barrier: Send + Sync {
    /// Decide whether the action may run at `now`
    ///
    /// # Errors
    /// `BarrierDenied` when the action is not currently permitted.
    fn check(&self, now: DateTime<Utc>) -> Result<(), BarrierDenied>;

    /// Record a confirmed success at `now`
    fn success(&mut self, now: DateTime<Utc>);

    /// Instant of the last recorded success
    fn last_success(&self) -> Option<DateTime<Utc>>;
}
