//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CoordinatorBlueprint, Dataset};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    account: String,
    update_interval_secs: u64,
    local_tz: String,
    gated_datasets: String,
    required_datasets: String,
    sensor_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    account: blueprint.account.label(),
                    update_interval_secs: blueprint.coordinator.update_interval_secs,
                    local_tz: blueprint.coordinator.local_tz.clone(),
                    gated_datasets: blueprint.barriers.gated().to_string(),
                    required_datasets: blueprint.required_datasets().to_string(),
                    sensor_count: blueprint.sensors.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &CoordinatorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sensors.is_empty() {
        warnings.push("No sensors configured - ticks will request nothing".to_string());
    }

    let gated = blueprint.barriers.gated();
    for sensor in &blueprint.sensors {
        let ungated = sensor.kind.datasets() - gated;
        if !ungated.is_empty() {
            warnings.push(format!(
                "Sensor '{}' needs {} but no barrier is configured - it will never update",
                sensor.name, ungated
            ));
        }
    }

    let unused = gated - blueprint.required_datasets();
    for dataset in unused.datasets() {
        warnings.push(format!(
            "barriers.{} is configured but no sensor requires it",
            dataset.name().to_ascii_lowercase()
        ));
    }

    if blueprint.required_datasets().has(Dataset::HistoricalGeneration) {
        warnings.push(
            "historical_generation is not published by the backend - sensors on it stay empty"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Account: {}", summary.account);
            println!("  Interval: {}s", summary.update_interval_secs);
            println!("  Timezone: {}", summary.local_tz);
            println!("  Barriers: {}", summary.gated_datasets);
            println!("  Required: {}", summary.required_datasets);
            println!("  Sensors: {}", summary.sensor_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
