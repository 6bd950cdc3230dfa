//! Dataset catalog
//!
//! `Dataset` names one concrete category of remote data. `DatasetKind` is the
//! bit-flag set used to express "which datasets are needed", including the
//! `ALL` and `NONE` sentinels. Iteration always goes through
//! [`DatasetKind::datasets`], which only ever yields concrete members.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A single, requestable data category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Instant power + accumulated energy reading
    Measure,
    /// Consumption periods over the trailing historical window
    HistoricalConsumption,
    /// Generation periods over the trailing historical window
    HistoricalGeneration,
    /// Maximum power demand records
    HistoricalPowerDemand,
}

impl Dataset {
    /// Every concrete dataset, in catalog (and fetch) order.
    pub const KNOWN: [Dataset; 4] = [
        Dataset::Measure,
        Dataset::HistoricalConsumption,
        Dataset::HistoricalGeneration,
        Dataset::HistoricalPowerDemand,
    ];

    /// Flag for this dataset
    pub const fn kind(self) -> DatasetKind {
        match self {
            Dataset::Measure => DatasetKind::MEASURE,
            Dataset::HistoricalConsumption => DatasetKind::HISTORICAL_CONSUMPTION,
            Dataset::HistoricalGeneration => DatasetKind::HISTORICAL_GENERATION,
            Dataset::HistoricalPowerDemand => DatasetKind::HISTORICAL_POWER_DEMAND,
        }
    }

    /// Upper-case name used in logs and metric labels
    pub const fn name(self) -> &'static str {
        match self {
            Dataset::Measure => "MEASURE",
            Dataset::HistoricalConsumption => "HISTORICAL_CONSUMPTION",
            Dataset::HistoricalGeneration => "HISTORICAL_GENERATION",
            Dataset::HistoricalPowerDemand => "HISTORICAL_POWER_DEMAND",
        }
    }

    /// Parse a dataset name (case-insensitive, `-` or `_` separators)
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "measure" => Some(Dataset::Measure),
            "historical_consumption" => Some(Dataset::HistoricalConsumption),
            "historical_generation" => Some(Dataset::HistoricalGeneration),
            "historical_power_demand" => Some(Dataset::HistoricalPowerDemand),
            _ => None,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of datasets
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DatasetKind: u8 {
        const MEASURE = 1 << 0;
        const HISTORICAL_CONSUMPTION = 1 << 1;
        const HISTORICAL_GENERATION = 1 << 2;
        const HISTORICAL_POWER_DEMAND = 1 << 3;

        /// Sentinel union of every dataset. Never a requestable member.
        const ALL = Self::MEASURE.bits()
            | Self::HISTORICAL_CONSUMPTION.bits()
            | Self::HISTORICAL_GENERATION.bits()
            | Self::HISTORICAL_POWER_DEMAND.bits();
    }
}

impl DatasetKind {
    /// The empty set
    pub const NONE: DatasetKind = DatasetKind::empty();

    /// Concrete datasets contained in this set, in catalog order.
    ///
    /// Walks `Dataset::KNOWN`, so the `ALL` sentinel cannot be produced.
    pub fn datasets(self) -> impl Iterator<Item = Dataset> {
        Dataset::KNOWN
            .into_iter()
            .filter(move |dataset| self.contains(dataset.kind()))
    }

    /// Membership test for a concrete dataset
    pub fn has(self, dataset: Dataset) -> bool {
        self.contains(dataset.kind())
    }

    /// Parse a comma separated list of dataset names, or `all` / `none`.
    pub fn parse_list(input: &str) -> Option<Self> {
        let mut kind = DatasetKind::NONE;
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "all" => kind |= DatasetKind::ALL,
                "none" => {}
                other => kind |= Dataset::from_name(other)?.kind(),
            }
        }
        Some(kind)
    }
}

impl From<Dataset> for DatasetKind {
    fn from(dataset: Dataset) -> Self {
        dataset.kind()
    }
}

impl FromIterator<Dataset> for DatasetKind {
    fn from_iter<I: IntoIterator<Item = Dataset>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DatasetKind::NONE, |acc, dataset| acc | dataset.kind())
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = self.datasets().map(Dataset::name).collect();
        f.write_str(&names.join(", "))
    }
}
