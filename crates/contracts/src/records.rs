//! Metering records returned by the API client
//!
//! Historical records are generic over their timestamp type. The client
//! hands back naive wall-clock values (`NaiveDateTime`); once annotated with
//! the configured zone they become [`LocalTimestamp`].

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::Serialize;

/// Timestamp annotated with the configured local zone
pub type LocalTimestamp = DateTime<Tz>;

/// Direct meter reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measure {
    /// Accumulated energy counter (kWh)
    pub accumulate: u64,
    /// Instant power (W)
    pub instant: f64,
}

/// One consumption or generation period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodValue<T> {
    pub start: T,
    pub end: T,
    /// Energy in the period (Wh)
    pub value: f64,
}

/// Historical consumption over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalConsumption<T = LocalTimestamp> {
    /// Total energy over the window (Wh)
    pub accumulated: f64,
    /// CO2 equivalent of `accumulated`
    pub accumulated_co2: f64,
    pub periods: Vec<PeriodValue<T>>,
}

/// Historical generation over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalGeneration<T = LocalTimestamp> {
    pub accumulated: f64,
    pub accumulated_co2: f64,
    pub periods: Vec<PeriodValue<T>>,
}

/// Power demand peak at a point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandAtInstant<T> {
    pub dt: T,
    /// Demand (W)
    pub value: f64,
}

/// Maximum power demand records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPowerDemand<T = LocalTimestamp> {
    pub demands: Vec<DemandAtInstant<T>>,
}

impl<T> HistoricalPowerDemand<T> {
    /// Highest recorded demand, if any
    pub fn peak(&self) -> Option<&DemandAtInstant<T>> {
        self.demands
            .iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))
    }
}

/// Raw consumption as returned by the client
pub type RawHistoricalConsumption = HistoricalConsumption<NaiveDateTime>;
/// Raw generation as returned by the client
pub type RawHistoricalGeneration = HistoricalGeneration<NaiveDateTime>;
/// Raw power demand as returned by the client
pub type RawHistoricalPowerDemand = HistoricalPowerDemand<NaiveDateTime>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_peak_demand() {
        let record = RawHistoricalPowerDemand {
            demands: vec![
                DemandAtInstant { dt: naive(1), value: 2100.0 },
                DemandAtInstant { dt: naive(2), value: 4300.0 },
                DemandAtInstant { dt: naive(3), value: 3900.0 },
            ],
        };
        let peak = record.peak().unwrap();
        assert_eq!(peak.dt, naive(2));
        assert_eq!(peak.value, 4300.0);
    }

    #[test]
    fn test_peak_demand_empty() {
        let record = RawHistoricalPowerDemand { demands: vec![] };
        assert!(record.peak().is_none());
    }

    #[test]
    fn test_raw_record_serializes_naive_timestamps() {
        let record = RawHistoricalConsumption {
            accumulated: 10.0,
            accumulated_co2: 1.5,
            periods: vec![PeriodValue {
                start: naive(0),
                end: naive(1),
                value: 10.0,
            }],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("2024-01-01T00:00:00"));
    }
}
