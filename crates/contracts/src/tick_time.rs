//! TickTime - wall-clock instant handed in by the host scheduler
//!
//! Barrier arithmetic needs an unambiguous instant, so a tick only accepts
//! UTC timestamps. Naive or non-UTC values are kept representable so the
//! precondition can be checked (and reported) at the boundary.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::ContractError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Instant supplied for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickTime {
    /// Timezone-aware instant
    Aware(DateTime<FixedOffset>),
    /// Wall-clock value without timezone
    Naive(NaiveDateTime),
}

impl TickTime {
    /// Current instant
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// Validate and convert to UTC
    ///
    /// # Errors
    /// - `MissingTimezone` for naive values
    /// - `NonUtcTimestamp` for aware values with a non-zero offset
    pub fn to_utc(self) -> Result<DateTime<Utc>, ContractError> {
        match self {
            TickTime::Naive(naive) => Err(ContractError::MissingTimezone { naive }),
            TickTime::Aware(dt) if dt.offset().local_minus_utc() != 0 => {
                Err(ContractError::NonUtcTimestamp {
                    offset: *dt.offset(),
                })
            }
            TickTime::Aware(dt) => Ok(dt.with_timezone(&Utc)),
        }
    }
}

impl From<DateTime<Utc>> for TickTime {
    fn from(dt: DateTime<Utc>) -> Self {
        TickTime::Aware(dt.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for TickTime {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        TickTime::Aware(dt)
    }
}

impl From<NaiveDateTime> for TickTime {
    fn from(naive: NaiveDateTime) -> Self {
        TickTime::Naive(naive)
    }
}

impl FromStr for TickTime {
    type Err = ContractError;

    /// Accepts RFC 3339 (`2024-01-01T00:00:00Z`) or a naive
    /// `YYYY-MM-DDTHH:MM:SS` value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(TickTime::Aware(dt));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
            .map(TickTime::Naive)
            .ok_or_else(|| ContractError::InvalidTimestamp {
                input: input.to_string(),
                message: "expected RFC 3339 or YYYY-MM-DDTHH:MM:SS".to_string(),
            })
    }
}
