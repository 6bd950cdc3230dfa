//! Coordinator session wiring for the CLI.

mod listener;
mod stats;

pub use listener::LogListener;
pub use stats::{sensor_lines, RunStats};

use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{Consumer, CoordinatorBlueprint, DatasetKind};
use coordinator::{
    sensors_from_blueprint, Coordinator, MockConfig, MockFailure, MockMeteringClient, Sensor,
};
use tracing::info;

/// Build a coordinator on the simulated backend with the configured sensors
///
/// `failing` datasets answer every request with a 503.
pub fn build_coordinator(
    blueprint: &CoordinatorBlueprint,
    failing: DatasetKind,
) -> Result<(Coordinator<MockMeteringClient>, Vec<Arc<Sensor>>)> {
    let mut mock = MockConfig::default().account(blueprint.account.label());
    for dataset in failing.datasets() {
        info!(dataset = %dataset, "Simulated backend will fail this dataset");
        mock = mock.fail(dataset, MockFailure::request_failed(503));
    }

    let mut coordinator =
        Coordinator::from_blueprint(MockMeteringClient::with_config(mock), blueprint)
            .context("Invalid coordinator settings")?;

    let sensors = sensors_from_blueprint(blueprint);
    for sensor in &sensors {
        coordinator
            .register_sensor(sensor.clone())
            .with_context(|| format!("Failed to register sensor '{}'", sensor.name()))?;
    }

    info!(
        coordinator = %coordinator.name(),
        sensors = sensors.len(),
        requested = %coordinator.requested_datasets(),
        "Coordinator ready"
    );

    Ok((coordinator, sensors))
}
