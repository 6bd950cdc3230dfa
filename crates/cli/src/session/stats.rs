//! Run statistics and snapshot rendering.

use std::sync::Arc;
use std::time::Duration;

use contracts::{Consumer, Snapshot};
use coordinator::{SchedulerStats, Sensor};

/// One line per sensor: name, value and unit
pub fn sensor_lines(snapshot: &Snapshot, sensors: &[Arc<Sensor>]) -> Vec<String> {
    sensors
        .iter()
        .map(|sensor| match sensor.value(snapshot) {
            Some(value) => format!("{}: {:.2} {}", sensor.name(), value, sensor.kind().unit()),
            None => format!("{}: unavailable", sensor.name()),
        })
        .collect()
}

/// Statistics from a scheduled run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Wall-clock duration of the run
    pub duration: Duration,

    pub scheduler: SchedulerStats,

    /// Snapshot at shutdown
    pub snapshot: Snapshot,
}

impl RunStats {
    /// Print detailed summary
    pub fn print_summary(&self, sensors: &[Arc<Sensor>]) {
        println!("\n=== Coordinator Run ===\n");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Ticks: {}", self.scheduler.ticks);
        println!("Forced refreshes: {}", self.scheduler.refreshes);
        println!("Rejected updates: {}", self.scheduler.failures);

        println!("\n{}", self.scheduler.metrics.summary());

        if !sensors.is_empty() {
            println!("Sensors:");
            for line in sensor_lines(&self.snapshot, sensors) {
                println!("  - {line}");
            }
        }

        println!();
    }
}
