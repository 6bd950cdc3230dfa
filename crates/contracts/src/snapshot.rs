//! Snapshot - Coordinator output
//!
//! Fixed-shape record holding the latest successful value of every dataset.

use serde::Serialize;

use crate::{
    Dataset, DatasetKind, HistoricalConsumption, HistoricalGeneration, HistoricalPowerDemand,
};

/// Merged data published to consumers
///
/// Every slot starts empty and is set once its dataset has been fetched.
/// A [`Fragment`] is a `Snapshot` carrying only the slots one tick produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Accumulated energy counter (kWh)
    pub measure_accumulated: Option<u64>,

    /// Instant power (W)
    pub measure_instant: Option<f64>,

    pub historical_consumption: Option<HistoricalConsumption>,

    pub historical_generation: Option<HistoricalGeneration>,

    pub historical_power_demand: Option<HistoricalPowerDemand>,
}

/// Partial snapshot produced by fetch routines
pub type Fragment = Snapshot;

impl Snapshot {
    /// Right-biased shallow merge
    ///
    /// Slots present in `fragment` overwrite ours; absent slots leave ours
    /// untouched.
    pub fn merge(&mut self, fragment: Fragment) {
        let Fragment {
            measure_accumulated,
            measure_instant,
            historical_consumption,
            historical_generation,
            historical_power_demand,
        } = fragment;

        if measure_accumulated.is_some() {
            self.measure_accumulated = measure_accumulated;
        }
        if measure_instant.is_some() {
            self.measure_instant = measure_instant;
        }
        if historical_consumption.is_some() {
            self.historical_consumption = historical_consumption;
        }
        if historical_generation.is_some() {
            self.historical_generation = historical_generation;
        }
        if historical_power_demand.is_some() {
            self.historical_power_demand = historical_power_demand;
        }
    }

    /// Consuming variant of [`Snapshot::merge`]
    pub fn merged(mut self, fragment: Fragment) -> Self {
        self.merge(fragment);
        self
    }

    /// Datasets with at least one populated slot
    pub fn populated(&self) -> DatasetKind {
        let mut kind = DatasetKind::NONE;
        if self.measure_accumulated.is_some() || self.measure_instant.is_some() {
            kind |= Dataset::Measure.kind();
        }
        if self.historical_consumption.is_some() {
            kind |= Dataset::HistoricalConsumption.kind();
        }
        if self.historical_generation.is_some() {
            kind |= Dataset::HistoricalGeneration.kind();
        }
        if self.historical_power_demand.is_some() {
            kind |= Dataset::HistoricalPowerDemand.kind();
        }
        kind
    }

    /// Number of populated slots
    pub fn slot_count(&self) -> usize {
        [
            self.measure_accumulated.is_some(),
            self.measure_instant.is_some(),
            self.historical_consumption.is_some(),
            self.historical_generation.is_some(),
            self.historical_power_demand.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// True when no slot is populated
    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0
    }
}
