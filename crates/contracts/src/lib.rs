//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the coordinator
//! workspace. Business crates depend on this crate, never the reverse.
//!
//! ## Time Model
//! - Ticks run on UTC instants (`DateTime<Utc>`), see [`TickTime`]
//! - Historical records arrive as naive local wall-clock values and are
//!   published as [`LocalTimestamp`] (annotated with the configured zone)

mod blueprint;
mod client;
mod consumer;
mod dataset;
mod error;
mod records;
mod snapshot;
mod tick_time;

pub use blueprint::*;
pub use client::{ApiError, LocalMeteringClient, MeteringClient};
pub use consumer::{Consumer, SensorKind, UpdateListener};
pub use dataset::{Dataset, DatasetKind};
pub use error::*;
pub use records::*;
pub use snapshot::{Fragment, Snapshot};
pub use tick_time::TickTime;
