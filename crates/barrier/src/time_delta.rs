//! Minimum-interval barrier.

use chrono::{DateTime, TimeDelta, Utc};

use crate::{Barrier, BarrierDenied};

/// Allows an action once `delta` has elapsed since the last success
///
/// The boundary is inclusive: at exactly `last_success + delta` the action is
/// allowed. A `now` earlier than the last success is denied.
#[derive(Debug, Clone)]
pub struct TimeDeltaBarrier {
    delta: TimeDelta,
    last_success: Option<DateTime<Utc>>,
}

impl TimeDeltaBarrier {
    /// Barrier that has never seen a success
    pub fn new(delta: TimeDelta) -> Self {
        Self {
            delta,
            last_success: None,
        }
    }

    /// Barrier seeded with a previous success
    pub fn with_last_success(delta: TimeDelta, last_success: DateTime<Utc>) -> Self {
        Self {
            delta,
            last_success: Some(last_success),
        }
    }

    /// Configured minimum interval
    pub fn delta(&self) -> TimeDelta {
        self.delta
    }
}

impl Barrier for TimeDeltaBarrier {
    fn check(&self, now: DateTime<Utc>) -> Result<(), BarrierDenied> {
        let Some(last) = self.last_success else {
            return Ok(());
        };

        let elapsed = now - last;
        if elapsed < TimeDelta::zero() {
            return Err(BarrierDenied::new(format!(
                "clock is behind last success ({last})"
            )));
        }
        if elapsed < self.delta {
            return Err(BarrierDenied::new(format!(
                "delta not reached ({}s elapsed, {}s required)",
                elapsed.num_seconds(),
                self.delta.num_seconds()
            )));
        }
        Ok(())
    }

    fn success(&mut self, now: DateTime<Utc>) {
        self.last_success = Some(now);
    }

    fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }
}
