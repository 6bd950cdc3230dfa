//! Logging update listener

use std::sync::Arc;

use contracts::{Consumer, Snapshot, UpdateListener};
use coordinator::Sensor;
use tracing::{debug, error, info};

/// Stands in for the host: logs every published snapshot
pub struct LogListener {
    sensors: Vec<Arc<Sensor>>,
}

impl LogListener {
    pub fn new(sensors: Vec<Arc<Sensor>>) -> Self {
        Self { sensors }
    }
}

impl UpdateListener for LogListener {
    fn notify(&self, snapshot: &Snapshot) {
        info!(
            populated = %snapshot.populated(),
            slots = snapshot.slot_count(),
            "Snapshot published"
        );

        for sensor in &self.sensors {
            match sensor.value(snapshot) {
                Some(value) => debug!(
                    sensor = sensor.name(),
                    value,
                    unit = sensor.kind().unit(),
                    "Sensor updated"
                ),
                None => debug!(sensor = sensor.name(), "Sensor unavailable"),
            }
        }
    }

    fn fail(&self, reason: &str) {
        error!(reason = %reason, "Coordinator update failed");
    }
}
