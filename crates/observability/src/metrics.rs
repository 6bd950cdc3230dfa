//! 更新指标收集模块
//!
//! 每个数据集的决策都记入 Prometheus 计数器，同时在内存中聚合，
//! 用于运行结束时的汇总输出。

use std::collections::BTreeMap;

use contracts::Dataset;
use metrics::{counter, gauge, histogram};

/// 单个数据集在一次 tick 中的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpdateOutcome {
    /// 已拉取并合并
    Updated,
    /// 被 barrier 拒绝
    Denied,
    /// 未配置 barrier
    Ignored,
    /// 拉取失败
    Failed,
}

impl UpdateOutcome {
    /// Metric label
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOutcome::Updated => "updated",
            UpdateOutcome::Denied => "denied",
            UpdateOutcome::Ignored => "ignored",
            UpdateOutcome::Failed => "failed",
        }
    }
}

/// 记录一个数据集的结果
pub fn record_dataset_outcome(dataset: Dataset, outcome: UpdateOutcome) {
    // 按数据集和结果打标签
    counter!(
        "ide_coordinator_dataset_updates_total",
        "dataset" => dataset.name(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// 记录一次完成（或失败）的 tick
pub fn record_tick(duration_ms: f64, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("ide_coordinator_ticks_total", "status" => status).increment(1);

    // tick 耗时 (毫秒)
    histogram!("ide_coordinator_tick_duration_ms").record(duration_ms);
}

/// 快照中已填充的槽位数
pub fn record_snapshot_slots(slots: usize) {
    gauge!("ide_coordinator_snapshot_slots").set(slots as f64);
}

/// 每个数据集的结果计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub updated: u64,
    pub denied: u64,
    pub ignored: u64,
    pub failed: u64,
}

impl OutcomeCounts {
    fn bump(&mut self, outcome: UpdateOutcome) {
        match outcome {
            UpdateOutcome::Updated => self.updated += 1,
            UpdateOutcome::Denied => self.denied += 1,
            UpdateOutcome::Ignored => self.ignored += 1,
            UpdateOutcome::Failed => self.failed += 1,
        }
    }

    /// Sum of all outcomes
    pub fn total(&self) -> u64 {
        self.updated + self.denied + self.ignored + self.failed
    }
}

/// 更新指标聚合器
///
/// 在内存中聚合，用于统计和汇总输出。
#[derive(Debug, Clone, Default)]
pub struct UpdateMetricsAggregator {
    /// 已完成的 tick 数
    pub total_ticks: u64,

    /// 整体被拒绝的 tick 数
    pub failed_ticks: u64,

    /// tick 耗时统计 (毫秒)
    pub tick_stats: RunningStats,

    /// Outcome counts per dataset
    pub outcomes: BTreeMap<Dataset, OutcomeCounts>,
}

impl UpdateMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account a finished tick
    pub fn record_tick(&mut self, duration_ms: f64, success: bool) {
        self.total_ticks += 1;
        if !success {
            self.failed_ticks += 1;
        }
        self.tick_stats.push(duration_ms);
    }

    /// Account one dataset decision
    pub fn record_outcome(&mut self, dataset: Dataset, outcome: UpdateOutcome) {
        self.outcomes.entry(dataset).or_default().bump(outcome);
    }

    /// 生成汇总报告
    pub fn summary(&self) -> MetricsSummary {
        let total_updates: u64 = self.outcomes.values().map(|c| c.updated).sum();
        let total_failures: u64 = self.outcomes.values().map(|c| c.failed).sum();
        // 只有真正发起的拉取才计入失败率
        let attempts = total_updates + total_failures;

        MetricsSummary {
            total_ticks: self.total_ticks,
            failed_ticks: self.failed_ticks,
            total_updates,
            total_failures,
            failure_rate: if attempts > 0 {
                total_failures as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            tick_duration_ms: StatsSummary::from(&self.tick_stats),
            outcomes: self.outcomes.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub failed_ticks: u64,
    pub total_updates: u64,
    pub total_failures: u64,
    /// Failed fetches over attempted fetches, percent
    pub failure_rate: f64,
    pub tick_duration_ms: StatsSummary,
    pub outcomes: BTreeMap<Dataset, OutcomeCounts>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Update Metrics Summary ===")?;
        writeln!(
            f,
            "Ticks: {} ({} rejected)",
            self.total_ticks, self.failed_ticks
        )?;
        writeln!(f, "Dataset updates: {}", self.total_updates)?;
        writeln!(
            f,
            "Fetch failures: {} ({:.2}%)",
            self.total_failures, self.failure_rate
        )?;
        writeln!(f, "Tick duration (ms): {}", self.tick_duration_ms)?;

        for (dataset, counts) in &self.outcomes {
            writeln!(
                f,
                "  {}: updated={} denied={} ignored={} failed={}",
                dataset, counts.updated, counts.denied, counts.ignored, counts.failed
            )?;
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计 (Welford 算法)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_outcomes() {
        let mut aggregator = UpdateMetricsAggregator::new();

        aggregator.record_tick(12.0, true);
        aggregator.record_outcome(Dataset::Measure, UpdateOutcome::Updated);
        aggregator.record_outcome(Dataset::HistoricalGeneration, UpdateOutcome::Failed);
        aggregator.record_tick(8.0, true);
        aggregator.record_outcome(Dataset::Measure, UpdateOutcome::Denied);
        aggregator.record_tick(0.1, false);

        assert_eq!(aggregator.total_ticks, 3);
        assert_eq!(aggregator.failed_ticks, 1);

        let measure = aggregator.outcomes[&Dataset::Measure];
        assert_eq!(measure.updated, 1);
        assert_eq!(measure.denied, 1);
        assert_eq!(measure.total(), 2);

        let summary = aggregator.summary();
        assert_eq!(summary.total_updates, 1);
        assert_eq!(summary.total_failures, 1);
        assert!((summary.failure_rate - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = UpdateMetricsAggregator::new();
        aggregator.record_tick(5.0, true);
        aggregator.record_outcome(Dataset::HistoricalConsumption, UpdateOutcome::Updated);

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Ticks: 1 (0 rejected)"));
        assert!(output.contains("HISTORICAL_CONSUMPTION: updated=1"));
        assert!(output.contains("0.00%"));
    }

    #[test]
    fn test_reset() {
        let mut aggregator = UpdateMetricsAggregator::new();
        aggregator.record_tick(5.0, true);
        aggregator.reset();
        assert_eq!(aggregator.total_ticks, 0);
        assert!(aggregator.outcomes.is_empty());
    }
}
