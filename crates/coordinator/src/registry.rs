//! Consumer registry
//!
//! The union of every member's datasets decides what a tick requests.

use std::sync::Arc;

use contracts::{Consumer, DatasetKind};
use tracing::{debug, warn};

use crate::error::{CoordinatorError, Result};

/// Registered consumers, in registration order
///
/// Membership is by identity (`Arc::ptr_eq`). Registering the same consumer
/// twice keeps two entries; each `unregister` removes one.
#[derive(Default)]
pub struct ConsumerRegistry {
    consumers: Vec<Arc<dyn Consumer>>,
}

impl ConsumerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a consumer
    ///
    /// # Errors
    /// `EmptyDatasets` when the consumer declares no dataset.
    pub fn register(&mut self, consumer: Arc<dyn Consumer>) -> Result<()> {
        if consumer.datasets().is_empty() {
            return Err(CoordinatorError::EmptyDatasets {
                name: consumer.name().to_string(),
            });
        }

        if self.contains(&consumer) {
            warn!(consumer = consumer.name(), "consumer registered twice");
        }

        debug!(
            consumer = consumer.name(),
            datasets = %consumer.datasets(),
            "consumer registered"
        );
        self.consumers.push(consumer);
        Ok(())
    }

    /// Remove one occurrence of a consumer
    ///
    /// # Errors
    /// `ConsumerNotRegistered` when the consumer is not a member.
    pub fn unregister(&mut self, consumer: &Arc<dyn Consumer>) -> Result<()> {
        let Some(index) = self
            .consumers
            .iter()
            .position(|member| Arc::ptr_eq(member, consumer))
        else {
            return Err(CoordinatorError::ConsumerNotRegistered {
                name: consumer.name().to_string(),
            });
        };

        self.consumers.remove(index);
        debug!(consumer = consumer.name(), "consumer unregistered");
        Ok(())
    }

    pub fn contains(&self, consumer: &Arc<dyn Consumer>) -> bool {
        self.consumers
            .iter()
            .any(|member| Arc::ptr_eq(member, consumer))
    }

    /// Union of every member's datasets; `NONE` when empty
    pub fn required_datasets(&self) -> DatasetKind {
        self.consumers
            .iter()
            .fold(DatasetKind::NONE, |acc, consumer| acc | consumer.datasets())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Consumer>> {
        self.consumers.iter()
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}

impl std::fmt::Debug for ConsumerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.consumers.iter().map(|c| c.name()))
            .finish()
    }
}
