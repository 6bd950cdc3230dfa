//! Scheduler - interval driver for one coordinator
//!
//! The coordinator lives inside a single task. Timer ticks, forced refreshes
//! and (un)registrations are serialized through that task, so two ticks never
//! overlap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use contracts::{Consumer, DatasetKind, MeteringClient, Snapshot, UpdateListener};
use observability::UpdateMetricsAggregator;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::coordinator::Coordinator;
use crate::error::{CoordinatorError, Result};

/// Source of tick timestamps
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// UTC clock driven by tokio's time source
///
/// Advances with `tokio::time::advance` when the runtime clock is paused.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin_utc: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(origin_utc: DateTime<Utc>) -> Self {
        Self {
            origin_utc,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap_or(TimeDelta::MAX);
        self.origin_utc + elapsed
    }
}

/// Scheduler settings
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Time between timer ticks
    pub update_interval: Duration,
    /// Stop after this many timer ticks (None = run until shutdown)
    pub max_ticks: Option<u64>,
    /// Pending command capacity
    pub command_capacity: usize,
    pub clock: Arc<dyn Clock>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(30),
            max_ticks: None,
            command_capacity: 16,
            clock: Arc::new(SystemClock),
        }
    }
}

impl std::fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("update_interval", &self.update_interval)
            .field("max_ticks", &self.max_ticks)
            .field("command_capacity", &self.command_capacity)
            .finish_non_exhaustive()
    }
}

/// Counters collected by the scheduler task
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Timer ticks run
    pub ticks: u64,
    /// Forced refreshes run
    pub refreshes: u64,
    /// Ticks or refreshes rejected as a whole
    pub failures: u64,
    pub metrics: UpdateMetricsAggregator,
}

enum Command {
    Refresh {
        datasets: DatasetKind,
        reply: oneshot::Sender<Result<Snapshot>>,
    },
    Register {
        consumer: Arc<dyn Consumer>,
        reply: oneshot::Sender<Result<()>>,
    },
    Unregister {
        consumer: Arc<dyn Consumer>,
        reply: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
}

/// Handle to a running scheduler task
///
/// Dropping the handle stops the task.
pub struct SchedulerHandle<C> {
    name: String,
    tx: mpsc::Sender<Command>,
    stop_tx: oneshot::Sender<()>,
    done_rx: watch::Receiver<()>,
    worker_handle: JoinHandle<(Coordinator<C>, SchedulerStats)>,
}

/// Spawns scheduler tasks
pub struct Scheduler;

impl Scheduler {
    /// Move `coordinator` into a new task and start ticking
    ///
    /// The first tick runs immediately.
    pub fn spawn<C>(
        coordinator: Coordinator<C>,
        listener: Arc<dyn UpdateListener>,
        config: SchedulerConfig,
    ) -> SchedulerHandle<C>
    where
        C: MeteringClient + Sync + 'static,
    {
        let name = coordinator.name().to_string();
        let (tx, rx) = mpsc::channel(config.command_capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = watch::channel(());

        let worker_handle = tokio::spawn(scheduler_loop(
            coordinator,
            listener,
            config,
            rx,
            stop_rx,
            done_tx,
        ));

        SchedulerHandle {
            name,
            tx,
            stop_tx,
            done_rx,
            worker_handle,
        }
    }
}

impl<C> SchedulerHandle<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task has exited (max ticks reached or stopped)
    pub fn is_finished(&self) -> bool {
        self.worker_handle.is_finished()
    }

    /// Resolves once the task has exited
    pub async fn finished(&self) {
        let mut done = self.done_rx.clone();
        // the sender only goes away with the task
        while done.changed().await.is_ok() {}
    }

    /// Forced refresh, serialized with timer ticks
    pub async fn refresh(&self, datasets: DatasetKind) -> Result<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Refresh { datasets, reply }).await?;
        rx.await.map_err(|_| CoordinatorError::SchedulerStopped)?
    }

    pub async fn register(&self, consumer: Arc<dyn Consumer>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Register { consumer, reply }).await?;
        rx.await.map_err(|_| CoordinatorError::SchedulerStopped)?
    }

    pub async fn unregister(&self, consumer: Arc<dyn Consumer>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Unregister { consumer, reply }).await?;
        rx.await.map_err(|_| CoordinatorError::SchedulerStopped)?
    }

    /// Latest published snapshot
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| CoordinatorError::SchedulerStopped)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CoordinatorError::SchedulerStopped)
    }

    /// Stop ticking and hand the coordinator back
    #[instrument(
        name = "coordinator_scheduler_shutdown",
        skip(self),
        fields(coordinator = %self.name)
    )]
    pub async fn shutdown(self) -> Result<(Coordinator<C>, SchedulerStats)> {
        // the task may already be gone after max_ticks
        let _ = self.stop_tx.send(());
        join(self.worker_handle, &self.name).await
    }

    /// Wait for the task to stop on its own (`max_ticks`)
    pub async fn wait(self) -> Result<(Coordinator<C>, SchedulerStats)> {
        let SchedulerHandle {
            name,
            tx,
            stop_tx,
            done_rx,
            worker_handle,
        } = self;
        let result = join(worker_handle, &name).await;
        drop((tx, stop_tx, done_rx));
        result
    }
}

async fn join<C>(
    worker_handle: JoinHandle<(Coordinator<C>, SchedulerStats)>,
    name: &str,
) -> Result<(Coordinator<C>, SchedulerStats)> {
    match worker_handle.await {
        Ok(output) => {
            debug!(coordinator = %name, "scheduler stopped");
            Ok(output)
        }
        Err(e) => {
            error!(coordinator = %name, error = ?e, "scheduler task panicked");
            Err(CoordinatorError::SchedulerStopped)
        }
    }
}

#[instrument(
    name = "coordinator_scheduler_loop",
    skip_all,
    fields(coordinator = %coordinator.name(), interval_secs = config.update_interval.as_secs())
)]
async fn scheduler_loop<C>(
    mut coordinator: Coordinator<C>,
    listener: Arc<dyn UpdateListener>,
    config: SchedulerConfig,
    mut rx: mpsc::Receiver<Command>,
    mut stop_rx: oneshot::Receiver<()>,
    _done: watch::Sender<()>,
) -> (Coordinator<C>, SchedulerStats)
where
    C: MeteringClient + Sync + 'static,
{
    let mut stats = SchedulerStats::default();
    let mut interval = tokio::time::interval(config.update_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("scheduler started");

    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => break,

            command = rx.recv() => {
                let Some(command) = command else { break };
                handle_command(&mut coordinator, listener.as_ref(), &config, &mut stats, command)
                    .await;
            }

            _ = interval.tick() => {
                let started = Instant::now();
                let result = coordinator.tick(config.clock.now()).await;
                stats.ticks += 1;
                publish(&coordinator, listener.as_ref(), &mut stats, started, &result);

                if config.max_ticks.is_some_and(|max| stats.ticks >= max) {
                    info!(ticks = stats.ticks, "max ticks reached");
                    break;
                }
            }
        }
    }

    info!(ticks = stats.ticks, refreshes = stats.refreshes, "scheduler stopped");
    (coordinator, stats)
}

async fn handle_command<C>(
    coordinator: &mut Coordinator<C>,
    listener: &dyn UpdateListener,
    config: &SchedulerConfig,
    stats: &mut SchedulerStats,
    command: Command,
) where
    C: MeteringClient + Sync + 'static,
{
    match command {
        Command::Refresh { datasets, reply } => {
            let started = Instant::now();
            let result = coordinator.refresh(datasets, config.clock.now()).await;
            stats.refreshes += 1;
            publish(coordinator, listener, stats, started, &result);
            let _ = reply.send(result);
        }
        Command::Register { consumer, reply } => {
            let _ = reply.send(coordinator.register_sensor(consumer));
        }
        Command::Unregister { consumer, reply } => {
            let _ = reply.send(coordinator.unregister_sensor(&consumer));
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(coordinator.data().clone());
        }
    }
}

/// Report a tick result to the listener and the stats
fn publish<C>(
    coordinator: &Coordinator<C>,
    listener: &dyn UpdateListener,
    stats: &mut SchedulerStats,
    started: Instant,
    result: &Result<Snapshot>,
) where
    C: MeteringClient + Sync + 'static,
{
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(snapshot) => {
            stats.metrics.record_tick(duration_ms, true);
            if let Some(report) = coordinator.last_report() {
                for (dataset, outcome) in &report.outcomes {
                    stats.metrics.record_outcome(*dataset, outcome.label());
                }
            }
            listener.notify(snapshot);
        }
        Err(e) => {
            stats.failures += 1;
            stats.metrics.record_tick(duration_ms, false);
            warn!(error = %e, "update failed");
            listener.fail(&e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::CoordinatorSettings;
    use crate::mock_client::MockMeteringClient;
    use crate::sensor::Sensor;
    use barrier::{BarrierSet, TimeDeltaBarrier};
    use chrono::TimeZone;
    use contracts::{Dataset, SensorKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingListener {
        snapshots: Mutex<Vec<Snapshot>>,
        failures: Mutex<Vec<String>>,
    }

    impl RecordingListener {
        fn notified(&self) -> usize {
            self.snapshots.lock().unwrap().len()
        }
    }

    impl UpdateListener for RecordingListener {
        fn notify(&self, snapshot: &Snapshot) {
            self.snapshots.lock().unwrap().push(snapshot.clone());
        }

        fn fail(&self, reason: &str) {
            self.failures.lock().unwrap().push(reason.to_string());
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap()
    }

    fn coordinator(
        client: MockMeteringClient,
        measure_interval: TimeDelta,
    ) -> Coordinator<MockMeteringClient> {
        let barriers = BarrierSet::new()
            .with(Dataset::Measure, TimeDeltaBarrier::new(measure_interval))
            .with(
                Dataset::HistoricalConsumption,
                TimeDeltaBarrier::new(TimeDelta::hours(6)),
            );
        Coordinator::new(client, barriers, CoordinatorSettings::default())
    }

    fn config(interval_secs: u64, max_ticks: Option<u64>) -> SchedulerConfig {
        SchedulerConfig {
            update_interval: Duration::from_secs(interval_secs),
            max_ticks,
            clock: Arc::new(TokioClock::starting_at(t0())),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_interval() {
        let client = MockMeteringClient::new();
        let mut coordinator = coordinator(client.clone(), TimeDelta::zero());
        coordinator
            .register_sensor(Arc::new(Sensor::new("power", SensorKind::InstantPower)))
            .unwrap();
        let listener = Arc::new(RecordingListener::default());

        let handle = Scheduler::spawn(coordinator, listener.clone(), config(30, None));
        tokio::time::sleep(Duration::from_secs(65)).await;
        let (_, stats) = handle.shutdown().await.unwrap();

        // t = 0, 30, 60
        assert_eq!(stats.ticks, 3);
        assert_eq!(listener.notified(), 3);
        assert_eq!(client.calls(Dataset::Measure), 3);
        assert_eq!(stats.metrics.total_ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_barrier_follows_scheduler_clock() {
        let client = MockMeteringClient::new();
        let mut coordinator = coordinator(client.clone(), TimeDelta::seconds(60));
        coordinator
            .register_sensor(Arc::new(Sensor::new("power", SensorKind::InstantPower)))
            .unwrap();

        let handle = Scheduler::spawn(
            coordinator,
            Arc::new(RecordingListener::default()),
            config(30, Some(4)),
        );
        let (coordinator, stats) = handle.wait().await.unwrap();

        // t = 0, 30, 60, 90: allowed at 0 and 60 only
        assert_eq!(stats.ticks, 4);
        assert_eq!(client.calls(Dataset::Measure), 2);
        let measure = stats.metrics.outcomes[&Dataset::Measure];
        assert_eq!(measure.updated, 2);
        assert_eq!(measure.denied, 2);
        assert_eq!(
            coordinator
                .barriers()
                .get(Dataset::Measure)
                .unwrap()
                .last_success(),
            Some(t0() + TimeDelta::seconds(60))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_and_refresh_through_handle() {
        let client = MockMeteringClient::new();
        let listener = Arc::new(RecordingListener::default());
        let handle = Scheduler::spawn(
            coordinator(client.clone(), TimeDelta::zero()),
            listener.clone(),
            config(3600, None),
        );
        // let the immediate first tick run on an empty registry
        tokio::time::sleep(Duration::from_secs(1)).await;

        let consumption: Arc<dyn Consumer> =
            Arc::new(Sensor::new("consumption", SensorKind::HistoricalConsumption));
        handle.register(consumption.clone()).await.unwrap();

        let snapshot = handle.refresh(DatasetKind::MEASURE).await.unwrap();
        assert!(snapshot.measure_instant.is_some());
        assert!(snapshot.historical_consumption.is_none());

        handle.unregister(consumption.clone()).await.unwrap();
        let err = handle.unregister(consumption).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::ConsumerNotRegistered { .. }));

        assert_eq!(handle.snapshot().await.unwrap(), snapshot);

        let (_, stats) = handle.shutdown().await.unwrap();
        assert_eq!(stats.refreshes, 1);
        assert_eq!(client.calls(Dataset::HistoricalConsumption), 0);
        assert!(listener.failures.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_after_stop_reports_stopped() {
        let handle = Scheduler::spawn(
            coordinator(MockMeteringClient::new(), TimeDelta::zero()),
            Arc::new(RecordingListener::default()),
            config(30, Some(1)),
        );

        handle.finished().await;
        assert!(handle.is_finished() || handle.tx.is_closed());

        let err = handle.refresh(DatasetKind::ALL).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::SchedulerStopped));
        assert!(handle.shutdown().await.is_ok());
    }
}
