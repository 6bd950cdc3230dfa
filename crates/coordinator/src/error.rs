//! Coordinator errors

use contracts::{ApiError, ContractError};
use thiserror::Error;

/// Errors surfaced to the host
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Tick rejected before any barrier or fetch was touched
    #[error(transparent)]
    Precondition(#[from] ContractError),

    /// `unregister` for a consumer that is not a member
    #[error("consumer '{name}' is not registered")]
    ConsumerNotRegistered { name: String },

    /// Consumer declares no datasets
    #[error("consumer '{name}' declares no datasets")]
    EmptyDatasets { name: String },

    /// Scheduler task is gone
    #[error("scheduler stopped")]
    SchedulerStopped,
}

/// Failure of a single dataset fetch
///
/// Never escapes a tick; it is logged and recorded in the report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("fetch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u128 },
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
