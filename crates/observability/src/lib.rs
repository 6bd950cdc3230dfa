//! # Observability
//!
//! Tracing + Prometheus metrics for the coordinator.
//!
//! - Tracing subscriber (JSON / pretty / compact), filtered by `RUST_LOG`
//! - Optional Prometheus scrape endpoint
//! - Per-dataset update counters and an in-memory aggregator for summaries
//!
//! ## Usage Example
//!
//! ```ignore
//! use observability::{LogFormat, ObservabilityConfig, UpdateOutcome};
//!
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     metrics_port: Some(9000),
//!     ..Default::default()
//! })?;
//!
//! observability::record_dataset_outcome(Dataset::Measure, UpdateOutcome::Updated);
//! ```

pub mod metrics;

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_dataset_outcome, record_snapshot_slots, record_tick, MetricsSummary, OutcomeCounts,
    RunningStats, StatsSummary, UpdateMetricsAggregator, UpdateOutcome,
};

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 不启用)
    pub metrics_port: Option<u16>,
    /// `RUST_LOG` 未设置时使用
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 结构化 JSON，每行一条
    Json,
    /// Multi-line, human readable
    Pretty,
    /// Single line
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => bail!("unknown log format '{other}' (expected json, pretty or compact)"),
        }
    }
}

/// 初始化 tracing；设置了端口时同时启动 Prometheus exporter
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    // RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let registry = tracing_subscriber::registry().with(filter);
    let initialized = match config.log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };
    initialized.context("Failed to initialize tracing subscriber")?;

    // 指标导出是可选的
    if let Some(port) = config.metrics_port {
        install_prometheus(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus recorder and its HTTP listener
///
/// For hosts that set up tracing themselves.
pub fn install_prometheus(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
