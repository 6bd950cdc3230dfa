//! # Coordinator
//!
//! Periodic refresh orchestrator for i-DE metering data.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler ──tick(now)──▶ Coordinator ──▶ BarrierSet (per dataset)
//!     │                        │
//!     │                        ├──▶ fetch routines ──▶ MeteringClient
//!     │                        └──▶ Snapshot (right-biased merge)
//!     └──notify / fail──▶ UpdateListener
//! ```
//!
//! ## Core Features
//!
//! - Requested datasets are the union of every registered consumer's needs
//! - A dataset without a barrier is never fetched
//! - One failing dataset never aborts a tick
//! - Naive historical timestamps are annotated with the configured zone
//!
//! ## Usage Example
//!
//! ```ignore
//! use coordinator::{Coordinator, CoordinatorSettings, MockMeteringClient, Sensor};
//!
//! let mut coordinator = Coordinator::new(client, barriers, CoordinatorSettings::default());
//! coordinator.register_sensor(Arc::new(Sensor::new("power", SensorKind::InstantPower)))?;
//! let snapshot = coordinator.tick(Utc::now()).await?;
//! ```

mod coordinator;
mod error;
mod fetch;
mod mock_client;
mod normalize;
mod registry;
mod report;
mod scheduler;
mod sensor;

pub use coordinator::{Coordinator, CoordinatorSettings, DEFAULT_NAME};
pub use error::{CoordinatorError, FetchError, Result};
pub use fetch::{fetch_dataset, FetchContext};
pub use mock_client::{MockConfig, MockFailure, MockMeteringClient};
pub use normalize::{localize, normalize_consumption, normalize_power_demand};
pub use registry::ConsumerRegistry;
pub use report::{DatasetOutcome, UpdateReport};
pub use scheduler::{
    Clock, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerStats, SystemClock, TokioClock,
};
pub use sensor::{sensors_from_blueprint, Sensor};
