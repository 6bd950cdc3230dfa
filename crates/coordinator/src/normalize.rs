//! Timestamp normalization
//!
//! The API reports local wall-clock values without a zone. They are
//! annotated with the configured zone; the wall-clock fields are kept.

use chrono::{LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use contracts::{
    DemandAtInstant, HistoricalConsumption, HistoricalPowerDemand, LocalTimestamp, PeriodValue,
    RawHistoricalConsumption, RawHistoricalPowerDemand,
};

/// Annotate a naive wall-clock value with `tz`
///
/// - Ambiguous values (DST fold) resolve to the earliest instant.
/// - Values inside a DST gap are read with the offset in effect before the
///   gap, so the result lands after the transition.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> LocalTimestamp {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // transitions are at most a few hours apart from their own gap
            let probe = naive - TimeDelta::hours(3);
            match tz.offset_from_local_datetime(&probe).earliest() {
                Some(before) => {
                    let offset = before.fix().local_minus_utc();
                    tz.from_utc_datetime(&(naive - TimeDelta::seconds(i64::from(offset))))
                }
                None => tz.from_utc_datetime(&naive),
            }
        }
    }
}

fn localize_periods(
    periods: Vec<PeriodValue<NaiveDateTime>>,
    tz: Tz,
) -> Vec<PeriodValue<LocalTimestamp>> {
    periods
        .into_iter()
        .map(|period| PeriodValue {
            start: localize(period.start, tz),
            end: localize(period.end, tz),
            value: period.value,
        })
        .collect()
}

/// Normalize every period boundary; totals are kept
pub fn normalize_consumption(raw: RawHistoricalConsumption, tz: Tz) -> HistoricalConsumption {
    HistoricalConsumption {
        accumulated: raw.accumulated,
        accumulated_co2: raw.accumulated_co2,
        periods: localize_periods(raw.periods, tz),
    }
}

/// Normalize the instant of every demand record
pub fn normalize_power_demand(raw: RawHistoricalPowerDemand, tz: Tz) -> HistoricalPowerDemand {
    HistoricalPowerDemand {
        demands: raw
            .demands
            .into_iter()
            .map(|demand| DemandAtInstant {
                dt: localize(demand.dt, tz),
                value: demand.value,
            })
            .collect(),
    }
}
