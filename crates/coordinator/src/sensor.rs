//! Sensors - the stock consumers of the snapshot

use std::sync::Arc;

use contracts::{Consumer, CoordinatorBlueprint, DatasetKind, SensorConfig, SensorKind, Snapshot};

/// A named reading taken from the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    name: String,
    kind: SensorKind,
}

impl Sensor {
    pub fn new(name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(config.name.clone(), config.kind)
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Current value, `None` until the backing dataset has been fetched
    ///
    /// Historical sensors report the window total; the power demand sensor
    /// reports the peak.
    pub fn value(&self, snapshot: &Snapshot) -> Option<f64> {
        match self.kind {
            SensorKind::AccumulatedConsumption => snapshot.measure_accumulated.map(|v| v as f64),
            SensorKind::InstantPower => snapshot.measure_instant,
            SensorKind::HistoricalConsumption => snapshot
                .historical_consumption
                .as_ref()
                .map(|c| c.accumulated),
            SensorKind::HistoricalGeneration => snapshot
                .historical_generation
                .as_ref()
                .map(|g| g.accumulated),
            SensorKind::HistoricalPowerDemand => snapshot
                .historical_power_demand
                .as_ref()
                .and_then(|d| d.peak())
                .map(|peak| peak.value),
        }
    }
}

impl Consumer for Sensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn datasets(&self) -> DatasetKind {
        self.kind.datasets()
    }
}

/// One sensor per `[[sensors]]` entry
pub fn sensors_from_blueprint(blueprint: &CoordinatorBlueprint) -> Vec<Arc<Sensor>> {
    blueprint
        .sensors
        .iter()
        .map(|config| Arc::new(Sensor::from_config(config)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Madrid;
    use contracts::{DemandAtInstant, HistoricalPowerDemand};

    #[test]
    fn test_value_before_fetch_is_none() {
        let snapshot = Snapshot::default();
        for kind in [
            SensorKind::AccumulatedConsumption,
            SensorKind::InstantPower,
            SensorKind::HistoricalConsumption,
            SensorKind::HistoricalGeneration,
            SensorKind::HistoricalPowerDemand,
        ] {
            assert_eq!(Sensor::new("s", kind).value(&snapshot), None);
        }
    }

    #[test]
    fn test_measure_values() {
        let snapshot = Snapshot {
            measure_accumulated: Some(12_345),
            measure_instant: Some(420.5),
            ..Default::default()
        };

        let accumulated = Sensor::new("acc", SensorKind::AccumulatedConsumption);
        let power = Sensor::new("power", SensorKind::InstantPower);
        assert_eq!(accumulated.value(&snapshot), Some(12_345.0));
        assert_eq!(power.value(&snapshot), Some(420.5));
        assert_eq!(power.datasets(), DatasetKind::MEASURE);
    }

    #[test]
    fn test_power_demand_reports_peak() {
        let at = |h| Madrid.with_ymd_and_hms(2024, 1, 3, h, 0, 0).unwrap();
        let snapshot = Snapshot {
            historical_power_demand: Some(HistoricalPowerDemand {
                demands: vec![
                    DemandAtInstant { dt: at(9), value: 3_100.0 },
                    DemandAtInstant { dt: at(20), value: 4_400.0 },
                ],
            }),
            ..Default::default()
        };

        let sensor = Sensor::new("demand", SensorKind::HistoricalPowerDemand);
        assert_eq!(sensor.value(&snapshot), Some(4_400.0));
    }
}
