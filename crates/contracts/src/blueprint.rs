//! CoordinatorBlueprint - Config Loader output
//!
//! Describes one coordinator: the account it polls, scheduling and timezone
//! settings, one barrier per gated dataset, and the sensors to register.

use std::time::Duration;

use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{ContractError, Dataset, DatasetKind, SensorKind};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的 coordinator 配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// 计量账户
    pub account: AccountConfig,

    /// Scheduling / normalization settings
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// 每个数据集的 barrier，没有 barrier 的数据集永远不会被拉取
    #[serde(default)]
    pub barriers: BarrierConfigs,

    /// 启动时注册的传感器
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

impl CoordinatorBlueprint {
    /// 所有已配置传感器所需数据集的并集
    pub fn required_datasets(&self) -> DatasetKind {
        self.sensors
            .iter()
            .fold(DatasetKind::NONE, |acc, sensor| acc | sensor.kind.datasets())
    }
}

/// 账户标识
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub username: String,

    /// Supply contract id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
}

impl AccountConfig {
    /// `"{username}/{contract}"`, or the bare username
    pub fn label(&self) -> String {
        match &self.contract {
            Some(contract) => format!("{}/{}", self.username, contract),
            None => self.username.clone(),
        }
    }
}

/// Coordinator 设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// tick 间隔 (秒)
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// IANA zone attached to naive historical timestamps
    #[serde(default = "default_local_tz")]
    pub local_tz: String,

    /// 历史窗口长度 (天)
    #[serde(default = "default_historical_period_days")]
    pub historical_period_days: u32,

    /// 单次拉取超时 (秒，0 = 不限制)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_update_interval_secs() -> u64 {
    30
}

fn default_local_tz() -> String {
    "Europe/Madrid".to_string()
}

fn default_historical_period_days() -> u32 {
    7
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval_secs(),
            local_tz: default_local_tz(),
            historical_period_days: default_historical_period_days(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl CoordinatorConfig {
    /// Tick interval
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Parsed local zone
    pub fn local_tz(&self) -> Result<Tz, ContractError> {
        self.local_tz
            .parse::<Tz>()
            .map_err(|_| ContractError::UnknownTimezone {
                name: self.local_tz.clone(),
            })
    }

    /// Historical window length
    pub fn historical_period(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.historical_period_days))
    }

    /// Per-fetch timeout, `None` when disabled
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}

/// 单个数据集的 barrier 设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierConfig {
    /// 两次成功拉取之间的最小间隔 (秒)
    pub min_interval_secs: u64,
}

impl BarrierConfig {
    /// Minimum interval as a chrono delta
    pub fn min_interval(&self) -> TimeDelta {
        i64::try_from(self.min_interval_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

/// 每个数据集一个可选的 barrier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BarrierConfigs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<BarrierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_consumption: Option<BarrierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_generation: Option<BarrierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_power_demand: Option<BarrierConfig>,
}

impl BarrierConfigs {
    /// Barrier configured for `dataset`
    pub fn get(&self, dataset: Dataset) -> Option<&BarrierConfig> {
        match dataset {
            Dataset::Measure => self.measure.as_ref(),
            Dataset::HistoricalConsumption => self.historical_consumption.as_ref(),
            Dataset::HistoricalGeneration => self.historical_generation.as_ref(),
            Dataset::HistoricalPowerDemand => self.historical_power_demand.as_ref(),
        }
    }

    /// Configured barriers in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (Dataset, &BarrierConfig)> {
        Dataset::KNOWN
            .into_iter()
            .filter_map(move |dataset| self.get(dataset).map(|config| (dataset, config)))
    }

    /// Datasets that have a barrier
    pub fn gated(&self) -> DatasetKind {
        self.iter().map(|(dataset, _)| dataset).collect()
    }
}

/// 传感器定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// 唯一名称
    pub name: String,

    /// What the sensor reports
    pub kind: SensorKind,
}
