//! Mock metering client
//!
//! Deterministic simulated backend, with per-dataset failure injection and
//! call counters. Clones share state, so a test can keep a handle while the
//! coordinator owns another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use contracts::{
    ApiError, Dataset, DemandAtInstant, Measure, MeteringClient, PeriodValue,
    RawHistoricalConsumption, RawHistoricalGeneration, RawHistoricalPowerDemand,
};
use tracing::instrument;

/// Failure injected for one dataset
#[derive(Debug, Clone, PartialEq)]
pub enum MockFailure {
    /// Return this error
    Error(ApiError),
    /// Never answer
    Hang,
}

impl MockFailure {
    pub fn request_failed(status: u16) -> Self {
        MockFailure::Error(ApiError::request_failed(status, "Internal Server Error"))
    }

    pub fn decode() -> Self {
        MockFailure::Error(ApiError::Decode {
            message: "unexpected end of JSON input".into(),
        })
    }

    pub fn command() -> Self {
        MockFailure::Error(ApiError::command("contract not selected"))
    }
}

/// Mock client configuration
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Reported by `account()`
    pub account: Option<String>,
    /// Failures by dataset
    pub failures: HashMap<Dataset, MockFailure>,
    /// Latency added to every call
    pub latency: Option<Duration>,
}

impl MockConfig {
    pub fn account(mut self, label: impl Into<String>) -> Self {
        self.account = Some(label.into());
        self
    }

    pub fn fail(mut self, dataset: Dataset, failure: MockFailure) -> Self {
        self.failures.insert(dataset, failure);
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    account: Option<String>,
    latency: Option<Duration>,
    failures: Mutex<HashMap<Dataset, MockFailure>>,
    calls: [AtomicU64; 4],
}

/// Simulated i-DE backend
#[derive(Debug, Clone, Default)]
pub struct MockMeteringClient {
    state: Arc<MockState>,
}

impl MockMeteringClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            state: Arc::new(MockState {
                account: config.account,
                latency: config.latency,
                failures: Mutex::new(config.failures),
                calls: Default::default(),
            }),
        }
    }

    /// Install, replace or clear (`None`) the failure for `dataset`
    pub fn set_failure(&self, dataset: Dataset, failure: Option<MockFailure>) {
        let mut failures = self
            .state
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match failure {
            Some(failure) => failures.insert(dataset, failure),
            None => failures.remove(&dataset),
        };
    }

    /// Upstream calls made for `dataset`
    pub fn calls(&self, dataset: Dataset) -> u64 {
        self.counter(dataset).load(Ordering::SeqCst)
    }

    /// Upstream calls across all datasets
    pub fn total_calls(&self) -> u64 {
        Dataset::KNOWN.into_iter().map(|d| self.calls(d)).sum()
    }

    fn counter(&self, dataset: Dataset) -> &AtomicU64 {
        let index = match dataset {
            Dataset::Measure => 0,
            Dataset::HistoricalConsumption => 1,
            Dataset::HistoricalGeneration => 2,
            Dataset::HistoricalPowerDemand => 3,
        };
        &self.state.calls[index]
    }

    /// Count the call, apply latency and injected failures
    ///
    /// Returns the 1-based call number.
    async fn enter(&self, dataset: Dataset) -> Result<u64, ApiError> {
        let call = self.counter(dataset).fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(latency) = self.state.latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self
            .state
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&dataset)
            .cloned();
        match failure {
            None => Ok(call),
            Some(MockFailure::Error(err)) => Err(err),
            Some(MockFailure::Hang) => std::future::pending().await,
        }
    }
}

/// Daily periods covering `[start, end)`
fn daily_periods(
    start: NaiveDateTime,
    end: NaiveDateTime,
    base: f64,
) -> Vec<PeriodValue<NaiveDateTime>> {
    let mut periods = Vec::new();
    let mut cursor = start;
    let mut day = 0.0;
    while cursor < end {
        let next = (cursor + TimeDelta::days(1)).min(end);
        periods.push(PeriodValue {
            start: cursor,
            end: next,
            value: base + day * 100.0,
        });
        cursor = next;
        day += 1.0;
    }
    periods
}

fn demand_at(day: u32, hour: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 1, day)?.and_hms_opt(hour, 15, 0)
}

impl MeteringClient for MockMeteringClient {
    fn account(&self) -> Option<String> {
        self.state.account.clone()
    }

    #[instrument(name = "mock_ide_get_measure", skip(self))]
    async fn get_measure(&self) -> Result<Measure, ApiError> {
        let call = self.enter(Dataset::Measure).await?;
        Ok(Measure {
            accumulate: 12_000 + call,
            instant: 350.0 + call as f64 * 10.0,
        })
    }

    #[instrument(name = "mock_ide_get_historical_consumption", skip(self))]
    async fn get_historical_consumption(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<RawHistoricalConsumption, ApiError> {
        self.enter(Dataset::HistoricalConsumption).await?;
        let periods = daily_periods(start, end, 8_000.0);
        let accumulated: f64 = periods.iter().map(|p| p.value).sum();
        Ok(RawHistoricalConsumption {
            accumulated,
            accumulated_co2: accumulated * 0.25,
            periods,
        })
    }

    #[instrument(name = "mock_ide_get_historical_generation", skip(self))]
    async fn get_historical_generation(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<RawHistoricalGeneration, ApiError> {
        self.enter(Dataset::HistoricalGeneration).await?;
        let periods = daily_periods(start, end, 3_000.0);
        let accumulated: f64 = periods.iter().map(|p| p.value).sum();
        Ok(RawHistoricalGeneration {
            accumulated,
            accumulated_co2: 0.0,
            periods,
        })
    }

    #[instrument(name = "mock_ide_get_historical_power_demand", skip(self))]
    async fn get_historical_power_demand(&self) -> Result<RawHistoricalPowerDemand, ApiError> {
        self.enter(Dataset::HistoricalPowerDemand).await?;
        let demands = [(3, 20, 4_100.0), (11, 21, 4_650.0), (24, 9, 3_900.0)]
            .into_iter()
            .filter_map(|(day, hour, value)| {
                demand_at(day, hour).map(|dt| DemandAtInstant { dt, value })
            })
            .collect();
        Ok(RawHistoricalPowerDemand { demands })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_calls_per_dataset() {
        let client = MockMeteringClient::new();
        let shared = client.clone();

        client.get_measure().await.unwrap();
        client.get_measure().await.unwrap();
        client.get_historical_power_demand().await.unwrap();

        assert_eq!(shared.calls(Dataset::Measure), 2);
        assert_eq!(shared.calls(Dataset::HistoricalPowerDemand), 1);
        assert_eq!(shared.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_measure_changes_per_call() {
        let client = MockMeteringClient::new();
        let first = client.get_measure().await.unwrap();
        let second = client.get_measure().await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_injected_failure_can_be_cleared() {
        let client = MockMeteringClient::with_config(
            MockConfig::default().fail(Dataset::Measure, MockFailure::decode()),
        );
        assert!(matches!(
            client.get_measure().await,
            Err(ApiError::Decode { .. })
        ));

        client.set_failure(Dataset::Measure, None);
        assert!(client.get_measure().await.is_ok());
        // failed calls are counted too
        assert_eq!(client.calls(Dataset::Measure), 2);
    }

    #[tokio::test]
    async fn test_daily_periods_cover_window() {
        let client = MockMeteringClient::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let end = start + TimeDelta::days(7);

        let raw = client.get_historical_consumption(start, end).await.unwrap();
        assert_eq!(raw.periods.len(), 7);
        assert_eq!(raw.periods[0].start, start);
        assert_eq!(raw.periods[6].end, end);
    }

    #[test]
    fn test_account_label() {
        let client = MockMeteringClient::with_config(MockConfig::default().account("me/42"));
        assert_eq!(client.account().as_deref(), Some("me/42"));
        assert_eq!(MockMeteringClient::new().account(), None);
    }
}
