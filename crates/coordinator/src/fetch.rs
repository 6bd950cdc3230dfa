//! Fetch dispatcher
//!
//! One routine per dataset. Each performs its upstream call(s), normalizes
//! timestamps and returns a fragment holding only its own slots.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use contracts::{ApiError, Dataset, Fragment, MeteringClient};
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::normalize::{normalize_consumption, normalize_power_demand};

/// Per-tick inputs shared by fetch routines
#[derive(Debug, Clone, Copy)]
pub struct FetchContext {
    pub now: DateTime<Utc>,
    pub local_tz: Tz,
    pub historical_period: TimeDelta,
    /// None = no limit
    pub timeout: Option<Duration>,
}

impl FetchContext {
    /// `[end - historical_period, end]`, `end` being `now` as local wall clock
    ///
    /// Fails when the start falls outside the representable range.
    pub fn historical_window(&self) -> Result<(NaiveDateTime, NaiveDateTime), ApiError> {
        let end = self.now.with_timezone(&self.local_tz).naive_local();
        let start = end
            .checked_sub_signed(self.historical_period)
            .ok_or_else(|| ApiError::Unexpected {
                message: format!(
                    "historical window out of range ({} days before {end})",
                    self.historical_period.num_days()
                ),
            })?;
        Ok((start, end))
    }
}

/// Run the fetch routine of `dataset`, bounded by the context timeout
pub async fn fetch_dataset<C: MeteringClient>(
    client: &C,
    dataset: Dataset,
    ctx: &FetchContext,
) -> Result<Fragment, FetchError> {
    match ctx.timeout {
        Some(limit) => tokio::time::timeout(limit, dispatch(client, dataset, ctx))
            .await
            .map_err(|_| FetchError::Timeout {
                timeout_ms: limit.as_millis(),
            })?,
        None => dispatch(client, dataset, ctx).await,
    }
}

async fn dispatch<C: MeteringClient>(
    client: &C,
    dataset: Dataset,
    ctx: &FetchContext,
) -> Result<Fragment, FetchError> {
    let fragment = match dataset {
        Dataset::Measure => fetch_measure(client).await?,
        Dataset::HistoricalConsumption => fetch_historical_consumption(client, ctx).await?,
        Dataset::HistoricalGeneration => fetch_historical_generation(client, ctx).await?,
        Dataset::HistoricalPowerDemand => fetch_historical_power_demand(client, ctx).await?,
    };
    Ok(fragment)
}

#[instrument(name = "coordinator_fetch_measure", skip(client))]
async fn fetch_measure<C: MeteringClient>(client: &C) -> Result<Fragment, ApiError> {
    let measure = client.get_measure().await?;

    Ok(Fragment {
        measure_accumulated: Some(measure.accumulate),
        measure_instant: Some(measure.instant),
        ..Default::default()
    })
}

#[instrument(name = "coordinator_fetch_historical_consumption", skip(client, ctx))]
async fn fetch_historical_consumption<C: MeteringClient>(
    client: &C,
    ctx: &FetchContext,
) -> Result<Fragment, ApiError> {
    let (start, end) = ctx.historical_window()?;
    debug!(%start, %end, "requesting consumption window");

    let raw = client.get_historical_consumption(start, end).await?;

    Ok(Fragment {
        historical_consumption: Some(normalize_consumption(raw, ctx.local_tz)),
        ..Default::default()
    })
}

/// Generation data is requested but not published yet
#[instrument(name = "coordinator_fetch_historical_generation", skip(client, ctx))]
async fn fetch_historical_generation<C: MeteringClient>(
    client: &C,
    ctx: &FetchContext,
) -> Result<Fragment, ApiError> {
    let (start, end) = ctx.historical_window()?;
    let raw = client.get_historical_generation(start, end).await?;
    debug!(periods = raw.periods.len(), "generation data discarded");

    Err(ApiError::NotImplemented {
        operation: "historical generation",
    })
}

#[instrument(name = "coordinator_fetch_historical_power_demand", skip(client, ctx))]
async fn fetch_historical_power_demand<C: MeteringClient>(
    client: &C,
    ctx: &FetchContext,
) -> Result<Fragment, ApiError> {
    let raw = client.get_historical_power_demand().await?;

    Ok(Fragment {
        historical_power_demand: Some(normalize_power_demand(raw, ctx.local_tz)),
        ..Default::default()
    })
}
