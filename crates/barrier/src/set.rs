//! BarrierSet - one barrier per dataset

use std::collections::HashMap;
use std::fmt;

use contracts::{BarrierConfigs, Dataset, DatasetKind};
use tracing::debug;

use crate::{Barrier, TimeDeltaBarrier};

/// Barriers keyed by dataset
///
/// Datasets missing from the set are disabled, not allowed by default.
#[derive(Default)]
pub struct BarrierSet {
    barriers: HashMap<Dataset, Box<dyn Barrier>>,
}

impl BarrierSet {
    /// Empty set: every dataset disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Build `TimeDeltaBarrier`s from configuration
    pub fn from_config(configs: &BarrierConfigs) -> Self {
        let mut set = Self::new();
        for (dataset, config) in configs.iter() {
            debug!(
                dataset = %dataset,
                min_interval_secs = config.min_interval_secs,
                "configured barrier"
            );
            set.insert(dataset, TimeDeltaBarrier::new(config.min_interval()));
        }
        set
    }

    /// Install (or replace) the barrier for `dataset`
    pub fn insert(&mut self, dataset: Dataset, barrier: impl Barrier + 'static) {
        self.barriers.insert(dataset, Box::new(barrier));
    }

    /// Builder-style [`BarrierSet::insert`]
    pub fn with(mut self, dataset: Dataset, barrier: impl Barrier + 'static) -> Self {
        self.insert(dataset, barrier);
        self
    }

    /// Remove the barrier for `dataset`, disabling it
    pub fn remove(&mut self, dataset: Dataset) -> Option<Box<dyn Barrier>> {
        self.barriers.remove(&dataset)
    }

    pub fn get(&self, dataset: Dataset) -> Option<&dyn Barrier> {
        self.barriers.get(&dataset).map(|barrier| barrier.as_ref())
    }

    pub fn get_mut(&mut self, dataset: Dataset) -> Option<&mut (dyn Barrier + 'static)> {
        self.barriers.get_mut(&dataset).map(|barrier| barrier.as_mut())
    }

    pub fn contains(&self, dataset: Dataset) -> bool {
        self.barriers.contains_key(&dataset)
    }

    /// Datasets that have a barrier
    pub fn gated(&self) -> DatasetKind {
        self.barriers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }
}

impl fmt::Debug for BarrierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarrierSet")
            .field("gated", &self.gated().to_string())
            .finish()
    }
}
