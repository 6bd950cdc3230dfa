//! Consumer and listener traits
//!
//! Consumers (sensors) declare the datasets they read. The listener is the
//! host capability the coordinator reports to after every tick.

use serde::{Deserialize, Serialize};

use crate::{Dataset, DatasetKind, Snapshot};

/// Something that reads from the published snapshot
pub trait Consumer: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Datasets this consumer depends on. Must not be empty.
    fn datasets(&self) -> DatasetKind;
}

/// Host-side receiver of tick results
pub trait UpdateListener: Send + Sync {
    /// A tick completed; `snapshot` is the newly published state
    fn notify(&self, snapshot: &Snapshot);

    /// A tick failed as a whole
    fn fail(&self, reason: &str);
}

/// Sensor kinds exposed by the integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Meter energy counter
    AccumulatedConsumption,
    /// Meter instant power
    InstantPower,
    HistoricalConsumption,
    HistoricalGeneration,
    HistoricalPowerDemand,
}

impl SensorKind {
    /// Datasets the sensor kind needs
    pub fn datasets(self) -> DatasetKind {
        match self {
            SensorKind::AccumulatedConsumption | SensorKind::InstantPower => {
                Dataset::Measure.kind()
            }
            SensorKind::HistoricalConsumption => Dataset::HistoricalConsumption.kind(),
            SensorKind::HistoricalGeneration => Dataset::HistoricalGeneration.kind(),
            SensorKind::HistoricalPowerDemand => Dataset::HistoricalPowerDemand.kind(),
        }
    }

    /// Unit of the value the sensor reports
    pub fn unit(self) -> &'static str {
        match self {
            SensorKind::AccumulatedConsumption => "kWh",
            SensorKind::InstantPower | SensorKind::HistoricalPowerDemand => "W",
            SensorKind::HistoricalConsumption | SensorKind::HistoricalGeneration => "Wh",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_kind_datasets() {
        assert_eq!(SensorKind::InstantPower.datasets(), DatasetKind::MEASURE);
        assert_eq!(
            SensorKind::AccumulatedConsumption.datasets(),
            DatasetKind::MEASURE
        );
        assert_eq!(
            SensorKind::HistoricalGeneration.datasets(),
            DatasetKind::HISTORICAL_GENERATION
        );
    }

    #[test]
    fn test_sensor_kind_serde() {
        let kind: SensorKind = serde_json::from_str("\"historical_power_demand\"").unwrap();
        assert_eq!(kind, SensorKind::HistoricalPowerDemand);
    }
}
