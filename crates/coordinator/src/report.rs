//! Per-tick report

use std::fmt;

use chrono::{DateTime, Utc};
use contracts::{Dataset, DatasetKind};
use observability::UpdateOutcome;

use crate::error::FetchError;

/// What happened to one requested dataset
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetOutcome {
    /// No barrier configured
    Ignored,
    /// Barrier refused
    Denied { reason: String },
    /// Fetched and merged
    Updated,
    /// Fetch failed, slot kept
    Failed { error: FetchError },
}

impl DatasetOutcome {
    pub fn label(&self) -> UpdateOutcome {
        match self {
            DatasetOutcome::Ignored => UpdateOutcome::Ignored,
            DatasetOutcome::Denied { .. } => UpdateOutcome::Denied,
            DatasetOutcome::Updated => UpdateOutcome::Updated,
            DatasetOutcome::Failed { .. } => UpdateOutcome::Failed,
        }
    }
}

/// Decisions taken during one tick, in catalog order
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub now: DateTime<Utc>,
    pub requested: DatasetKind,
    pub outcomes: Vec<(Dataset, DatasetOutcome)>,
}

impl UpdateReport {
    pub fn new(now: DateTime<Utc>, requested: DatasetKind) -> Self {
        Self {
            now,
            requested,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, dataset: Dataset, outcome: DatasetOutcome) {
        self.outcomes.push((dataset, outcome));
    }

    pub fn outcome(&self, dataset: Dataset) -> Option<&DatasetOutcome> {
        self.outcomes
            .iter()
            .find(|(d, _)| *d == dataset)
            .map(|(_, outcome)| outcome)
    }

    /// Datasets merged during the tick
    pub fn updated(&self) -> DatasetKind {
        self.with_label(UpdateOutcome::Updated)
    }

    /// Datasets whose fetch failed
    pub fn failed(&self) -> DatasetKind {
        self.with_label(UpdateOutcome::Failed)
    }

    fn with_label(&self, label: UpdateOutcome) -> DatasetKind {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.label() == label)
            .map(|(dataset, _)| *dataset)
            .collect()
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick at {} (requested: {})", self.now, self.requested)?;
        for (dataset, outcome) in &self.outcomes {
            match outcome {
                DatasetOutcome::Ignored => write!(f, "\n  {dataset}: ignored")?,
                DatasetOutcome::Denied { reason } => write!(f, "\n  {dataset}: denied ({reason})")?,
                DatasetOutcome::Updated => write!(f, "\n  {dataset}: updated")?,
                DatasetOutcome::Failed { error } => write!(f, "\n  {dataset}: failed ({error})")?,
            }
        }
        Ok(())
    }
}
