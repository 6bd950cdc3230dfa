//! # Integration Tests
//!
//! Cross-crate scenarios run against the simulated backend:
//! - config file -> blueprint -> coordinator
//! - barrier gating across consecutive ticks
//! - scheduler driven end to end on a paused clock

#[cfg(test)]
mod contract_tests {
    use contracts::{Dataset, DatasetKind};

    #[test]
    fn test_catalog_covers_all_sentinel() {
        let all: DatasetKind = Dataset::KNOWN.into_iter().collect();
        assert_eq!(all, DatasetKind::ALL);
        assert_eq!(DatasetKind::ALL.datasets().count(), Dataset::KNOWN.len());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
    use config_loader::ConfigLoader;
    use contracts::{
        Consumer, ContractError, CoordinatorBlueprint, Dataset, DatasetKind, SensorKind,
        Snapshot, UpdateListener,
    };
    use coordinator::{
        sensors_from_blueprint, Coordinator, CoordinatorError, DatasetOutcome, MockConfig,
        MockFailure, MockMeteringClient, Scheduler, SchedulerConfig, Sensor, TokioClock,
    };

    const CONFIG: &str = r#"
[account]
username = "user@example.com"
contract = "ES0021"

[coordinator]
update_interval_secs = 30
local_tz = "Europe/Madrid"
historical_period_days = 7

[barriers.measure]
min_interval_secs = 300

[barriers.historical_consumption]
min_interval_secs = 3600

[barriers.historical_generation]
min_interval_secs = 3600

[barriers.historical_power_demand]
min_interval_secs = 86400

[[sensors]]
name = "instant_power"
kind = "instant_power"

[[sensors]]
name = "consumption"
kind = "historical_consumption"
"#;

    fn blueprint() -> CoordinatorBlueprint {
        ConfigLoader::load_from_str(CONFIG, config_loader::ConfigFormat::Toml).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 1, 8)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn coordinator_from_config(
        client: MockMeteringClient,
    ) -> (Coordinator<MockMeteringClient>, Vec<Arc<Sensor>>) {
        let bp = blueprint();
        let mut coordinator = Coordinator::from_blueprint(client, &bp).unwrap();
        let sensors = sensors_from_blueprint(&bp);
        for sensor in &sensors {
            coordinator.register_sensor(sensor.clone()).unwrap();
        }
        (coordinator, sensors)
    }

    /// Records every published snapshot
    #[derive(Default)]
    struct CollectingListener {
        snapshots: Mutex<Vec<Snapshot>>,
        failures: Mutex<Vec<String>>,
    }

    impl UpdateListener for CollectingListener {
        fn notify(&self, snapshot: &Snapshot) {
            self.snapshots.lock().unwrap().push(snapshot.clone());
        }

        fn fail(&self, reason: &str) {
            self.failures.lock().unwrap().push(reason.to_string());
        }
    }

    /// Config file -> coordinator -> ticks across barrier windows
    #[tokio::test]
    async fn test_config_to_gated_ticks() {
        let client = MockMeteringClient::with_config(
            MockConfig::default().account("user@example.com/ES0021"),
        );
        let (mut coordinator, sensors) = coordinator_from_config(client.clone());
        assert_eq!(coordinator.name(), "user@example.com/ES0021 coordinator");
        assert_eq!(
            coordinator.requested_datasets(),
            DatasetKind::MEASURE | DatasetKind::HISTORICAL_CONSUMPTION
        );

        // first tick fetches everything requested
        let snapshot = coordinator.tick(t0()).await.unwrap();
        assert_eq!(snapshot.measure_instant, Some(360.0));
        assert!(snapshot.historical_consumption.is_some());
        assert_eq!(sensors[0].value(&snapshot), Some(360.0));

        // 30s later both barriers deny, the snapshot is unchanged
        let snapshot = coordinator.tick(t0() + TimeDelta::seconds(30)).await.unwrap();
        assert_eq!(snapshot.measure_instant, Some(360.0));
        assert_eq!(client.calls(Dataset::Measure), 1);
        let report = coordinator.last_report().unwrap();
        assert!(matches!(
            report.outcome(Dataset::Measure),
            Some(DatasetOutcome::Denied { .. })
        ));

        // past the measure interval only measure is refetched
        let snapshot = coordinator.tick(t0() + TimeDelta::seconds(300)).await.unwrap();
        assert_eq!(snapshot.measure_instant, Some(370.0));
        assert_eq!(client.calls(Dataset::Measure), 2);
        assert_eq!(client.calls(Dataset::HistoricalConsumption), 1);

        // never requested, never called
        assert_eq!(client.calls(Dataset::HistoricalPowerDemand), 0);
        assert_eq!(client.calls(Dataset::HistoricalGeneration), 0);
    }

    /// An oversized historical window is refused at load time
    #[test]
    fn test_oversized_history_rejected_by_loader() {
        let config = CONFIG.replace(
            "historical_period_days = 7",
            "historical_period_days = 100000000",
        );
        let err = ConfigLoader::load_from_str(&config, config_loader::ConfigFormat::Toml)
            .unwrap_err();
        assert!(matches!(
            err,
            ContractError::ConfigValidation { ref field, .. }
                if field == "coordinator.historical_period_days"
        ));
    }

    /// Two consumers share a dataset; removing one keeps it requested
    #[tokio::test]
    async fn test_unregister_one_of_two_consumers() {
        let client = MockMeteringClient::new();
        let bp = blueprint();
        let mut coordinator = Coordinator::from_blueprint(client.clone(), &bp).unwrap();

        let power: Arc<dyn Consumer> = Arc::new(Sensor::new("power", SensorKind::InstantPower));
        let energy: Arc<dyn Consumer> =
            Arc::new(Sensor::new("energy", SensorKind::AccumulatedConsumption));
        let demand: Arc<dyn Consumer> =
            Arc::new(Sensor::new("demand", SensorKind::HistoricalPowerDemand));
        coordinator.register_sensor(power.clone()).unwrap();
        coordinator.register_sensor(energy.clone()).unwrap();
        coordinator.register_sensor(demand.clone()).unwrap();

        coordinator.unregister_sensor(&power).unwrap();
        coordinator.unregister_sensor(&demand).unwrap();
        assert_eq!(coordinator.requested_datasets(), DatasetKind::MEASURE);

        let snapshot = coordinator.tick(t0()).await.unwrap();
        assert_eq!(snapshot.measure_accumulated, Some(12_001));
        assert_eq!(client.calls(Dataset::HistoricalPowerDemand), 0);

        // second removal of the same consumer is rejected
        let err = coordinator.unregister_sensor(&power).unwrap_err();
        assert!(matches!(err, CoordinatorError::ConsumerNotRegistered { .. }));
    }

    /// A failing dataset never blocks the others and keeps its old slot
    #[tokio::test]
    async fn test_failures_are_isolated() {
        let client = MockMeteringClient::new();
        let bp = blueprint();
        let mut coordinator = Coordinator::from_blueprint(client.clone(), &bp).unwrap();
        coordinator
            .register_sensor(Arc::new(Sensor::new("power", SensorKind::InstantPower)))
            .unwrap();
        coordinator
            .register_sensor(Arc::new(Sensor::new(
                "generation",
                SensorKind::HistoricalGeneration,
            )))
            .unwrap();

        let snapshot = coordinator.tick(t0()).await.unwrap();
        assert!(snapshot.measure_instant.is_some());
        assert!(snapshot.historical_generation.is_none());
        assert_eq!(client.calls(Dataset::HistoricalGeneration), 1);

        // a failed fetch does not consume the barrier
        coordinator.tick(t0() + TimeDelta::seconds(1)).await.unwrap();
        assert_eq!(client.calls(Dataset::HistoricalGeneration), 2);

        // measure failing later keeps the previous reading
        client.set_failure(Dataset::Measure, Some(MockFailure::request_failed(503)));
        let snapshot = coordinator.tick(t0() + TimeDelta::seconds(600)).await.unwrap();
        assert_eq!(snapshot.measure_instant, Some(360.0));
        assert_eq!(
            coordinator.last_report().unwrap().failed(),
            DatasetKind::MEASURE | DatasetKind::HISTORICAL_GENERATION
        );
    }

    /// Naive tick times are rejected before anything is fetched
    #[tokio::test]
    async fn test_naive_tick_is_rejected() {
        let client = MockMeteringClient::new();
        let (mut coordinator, _) = coordinator_from_config(client.clone());

        let naive = t0().naive_utc();
        let err = coordinator.tick(naive).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::Precondition(_)));
        assert_eq!(client.total_calls(), 0);
        assert!(coordinator.data().is_empty());

        // barriers did not move
        coordinator.tick(t0()).await.unwrap();
        assert_eq!(client.calls(Dataset::Measure), 1);
    }

    /// Scheduler drives the coordinator built from config
    #[tokio::test(start_paused = true)]
    async fn test_scheduler_end_to_end() {
        let client = MockMeteringClient::new();
        let (coordinator, _) = coordinator_from_config(client.clone());
        let listener = Arc::new(CollectingListener::default());

        let config = SchedulerConfig {
            update_interval: Duration::from_secs(30),
            max_ticks: Some(11),
            clock: Arc::new(TokioClock::starting_at(t0())),
            ..Default::default()
        };
        let handle = Scheduler::spawn(coordinator, listener.clone(), config);
        let (coordinator, stats) = handle.wait().await.unwrap();

        // ticks at 0s..300s: measure passes at 0 and 300
        assert_eq!(stats.ticks, 11);
        assert_eq!(client.calls(Dataset::Measure), 2);
        assert_eq!(client.calls(Dataset::HistoricalConsumption), 1);
        assert_eq!(listener.snapshots.lock().unwrap().len(), 11);
        assert!(listener.failures.lock().unwrap().is_empty());
        assert_eq!(coordinator.data().measure_instant, Some(370.0));

        let summary = stats.metrics.summary();
        assert_eq!(summary.total_ticks, 11);
    }
}
