//! Update orchestrator
//!
//! A tick walks the catalog in order and, for every requested dataset,
//! consults its barrier, fetches, merges and advances the barrier. A failing
//! dataset never aborts the tick; its slot keeps its previous value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use barrier::BarrierSet;
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use contracts::{
    Consumer, ContractError, CoordinatorBlueprint, CoordinatorConfig, DatasetKind, Fragment,
    MeteringClient, Snapshot, TickTime,
};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::fetch::{fetch_dataset, FetchContext};
use crate::registry::ConsumerRegistry;
use crate::report::{DatasetOutcome, UpdateReport};

/// Name used when the client knows no account
pub const DEFAULT_NAME: &str = "i-de coordinator";

/// Normalization and fetch settings
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    pub local_tz: Tz,
    pub historical_period: TimeDelta,
    /// Per-fetch limit, None = unbounded
    pub fetch_timeout: Option<Duration>,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            local_tz: chrono_tz::Europe::Madrid,
            historical_period: TimeDelta::days(7),
            fetch_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl TryFrom<&CoordinatorConfig> for CoordinatorSettings {
    type Error = ContractError;

    fn try_from(config: &CoordinatorConfig) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            local_tz: config.local_tz()?,
            historical_period: config.historical_period(),
            fetch_timeout: config.fetch_timeout(),
        })
    }
}

/// Periodic refresh orchestrator for one account
pub struct Coordinator<C> {
    name: String,
    client: C,
    barriers: BarrierSet,
    registry: ConsumerRegistry,
    data: Snapshot,
    settings: CoordinatorSettings,
    last_report: Option<UpdateReport>,
}

impl<C: MeteringClient + Sync> Coordinator<C> {
    pub fn new(client: C, barriers: BarrierSet, settings: CoordinatorSettings) -> Self {
        let name = match client.account() {
            Some(account) => format!("{account} coordinator"),
            None => DEFAULT_NAME.to_string(),
        };

        info!(
            coordinator = %name,
            gated = %barriers.gated(),
            local_tz = %settings.local_tz,
            "coordinator created"
        );

        Self {
            name,
            client,
            barriers,
            registry: ConsumerRegistry::new(),
            data: Snapshot::default(),
            settings,
            last_report: None,
        }
    }

    /// Build barriers and settings from a blueprint
    ///
    /// Sensors are not registered here.
    pub fn from_blueprint(
        client: C,
        blueprint: &CoordinatorBlueprint,
    ) -> std::result::Result<Self, ContractError> {
        let settings = CoordinatorSettings::try_from(&blueprint.coordinator)?;
        let barriers = BarrierSet::from_config(&blueprint.barriers);
        Ok(Self::new(client, barriers, settings))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Latest published snapshot
    pub fn data(&self) -> &Snapshot {
        &self.data
    }

    pub fn barriers(&self) -> &BarrierSet {
        &self.barriers
    }

    pub fn barriers_mut(&mut self) -> &mut BarrierSet {
        &mut self.barriers
    }

    pub fn registry(&self) -> &ConsumerRegistry {
        &self.registry
    }

    /// Report of the last tick that passed its preconditions
    pub fn last_report(&self) -> Option<&UpdateReport> {
        self.last_report.as_ref()
    }

    pub fn register_sensor(&mut self, consumer: Arc<dyn Consumer>) -> Result<()> {
        self.registry.register(consumer)
    }

    pub fn unregister_sensor(&mut self, consumer: &Arc<dyn Consumer>) -> Result<()> {
        self.registry.unregister(consumer)
    }

    /// Datasets the registered consumers depend on
    pub fn requested_datasets(&self) -> DatasetKind {
        self.registry.required_datasets()
    }

    /// Refresh everything the registered consumers need
    ///
    /// # Errors
    /// `Precondition` when `now` is not a UTC timestamp. Nothing is fetched
    /// and no barrier moves in that case.
    #[instrument(name = "coordinator_tick", skip(self, now), fields(coordinator = %self.name))]
    pub async fn tick(&mut self, now: impl Into<TickTime>) -> Result<Snapshot> {
        let requested = self.requested_datasets();
        debug!(datasets = %requested, "Request update for datasets");
        self.run(requested, now.into()).await
    }

    /// Forced refresh of an explicit dataset set
    ///
    /// Barriers still apply.
    #[instrument(
        name = "coordinator_refresh",
        skip(self, now),
        fields(coordinator = %self.name, datasets = %datasets)
    )]
    pub async fn refresh(
        &mut self,
        datasets: DatasetKind,
        now: impl Into<TickTime>,
    ) -> Result<Snapshot> {
        self.run(datasets, now.into()).await
    }

    /// Run the update algorithm without merging into the snapshot
    pub async fn update_raw(
        &mut self,
        datasets: DatasetKind,
        now: impl Into<TickTime>,
    ) -> Result<Fragment> {
        let now = now.into().to_utc()?;
        Ok(self.update_at(datasets, now).await)
    }

    /// Host-driven right-biased merge into the snapshot
    pub fn update_internal_data(&mut self, fragment: Fragment) {
        self.data.merge(fragment);
        observability::record_snapshot_slots(self.data.slot_count());
    }

    async fn run(&mut self, datasets: DatasetKind, now: TickTime) -> Result<Snapshot> {
        let started = Instant::now();

        let now = match now.to_utc() {
            Ok(now) => now,
            Err(e) => {
                observability::record_tick(elapsed_ms(started), false);
                return Err(e.into());
            }
        };

        let fragment = self.update_at(datasets, now).await;
        self.update_internal_data(fragment);

        observability::record_tick(elapsed_ms(started), true);
        Ok(self.data.clone())
    }

    async fn update_at(&mut self, datasets: DatasetKind, now: DateTime<Utc>) -> Fragment {
        let ctx = FetchContext {
            now,
            local_tz: self.settings.local_tz,
            historical_period: self.settings.historical_period,
            timeout: self.settings.fetch_timeout,
        };
        let mut report = UpdateReport::new(now, datasets);
        let mut fragment = Fragment::default();

        for dataset in datasets.datasets() {
            let Some(barrier) = self.barriers.get(dataset) else {
                debug!(dataset = %dataset, "update ignored: no barrier defined");
                report.push(dataset, DatasetOutcome::Ignored);
                continue;
            };

            if let Err(denied) = barrier.check(now) {
                debug!(dataset = %dataset, reason = %denied, "update denied");
                report.push(
                    dataset,
                    DatasetOutcome::Denied {
                        reason: denied.reason,
                    },
                );
                continue;
            }

            debug!(dataset = %dataset, "update allowed");
            let outcome = match fetch_dataset(&self.client, dataset, &ctx).await {
                Ok(data) => {
                    fragment.merge(data);
                    if let Some(barrier) = self.barriers.get_mut(dataset) {
                        barrier.success(now);
                    }
                    debug!(dataset = %dataset, "update successful");
                    DatasetOutcome::Updated
                }
                Err(error) => {
                    debug!(dataset = %dataset, error = %error, "update error");
                    DatasetOutcome::Failed { error }
                }
            };
            report.push(dataset, outcome);
        }

        for (dataset, outcome) in &report.outcomes {
            observability::record_dataset_outcome(*dataset, outcome.label());
        }
        self.last_report = Some(report);

        fragment
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

impl<C> std::fmt::Debug for Coordinator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.name)
            .field("barriers", &self.barriers)
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
