//! `refresh` command implementation.

use anyhow::{Context, Result};
use contracts::{DatasetKind, Snapshot, TickTime};
use serde::Serialize;
use tracing::info;

use crate::cli::RefreshArgs;
use crate::session::{build_coordinator, sensor_lines};

/// Refresh result for JSON output
#[derive(Serialize)]
struct RefreshOutput {
    coordinator: String,
    requested: String,
    outcomes: Vec<OutcomeEntry>,
    snapshot: Snapshot,
}

#[derive(Serialize)]
struct OutcomeEntry {
    dataset: String,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// Execute the `refresh` command
pub async fn run_refresh(args: &RefreshArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let datasets = DatasetKind::parse_list(&args.datasets)
        .with_context(|| format!("Unknown dataset in '{}'", args.datasets))?;

    let now: TickTime = match &args.now {
        Some(now) => now.parse().context("Invalid --now")?,
        None => TickTime::now(),
    };

    let (mut coordinator, sensors) = build_coordinator(&blueprint, DatasetKind::NONE)?;

    let snapshot = coordinator
        .refresh(datasets, now)
        .await
        .context("Refresh rejected")?;

    if args.json {
        let output = RefreshOutput {
            coordinator: coordinator.name().to_string(),
            requested: datasets.to_string(),
            outcomes: coordinator
                .last_report()
                .map(|report| {
                    report
                        .outcomes
                        .iter()
                        .map(|(dataset, outcome)| OutcomeEntry {
                            dataset: dataset.to_string(),
                            outcome: outcome.label().as_str().to_string(),
                            detail: detail(outcome),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            snapshot,
        };
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialize snapshot")?;
        println!("{}", json);
    } else {
        if let Some(report) = coordinator.last_report() {
            println!("{report}\n");
        }
        for line in sensor_lines(&snapshot, &sensors) {
            println!("{line}");
        }
    }

    Ok(())
}

fn detail(outcome: &coordinator::DatasetOutcome) -> Option<String> {
    match outcome {
        coordinator::DatasetOutcome::Denied { reason } => Some(reason.clone()),
        coordinator::DatasetOutcome::Failed { error } => Some(error.to_string()),
        _ => None,
    }
}
