//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{CoordinatorBlueprint, Dataset};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    account: String,
    coordinator: SettingsInfo,
    barriers: Vec<BarrierInfo>,
    sensors: Vec<SensorInfo>,
    required_datasets: Vec<Dataset>,
}

#[derive(Serialize)]
struct SettingsInfo {
    update_interval_secs: u64,
    local_tz: String,
    historical_period_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch_timeout_secs: Option<u64>,
}

#[derive(Serialize)]
struct BarrierInfo {
    dataset: Dataset,
    /// `None` when the dataset is never fetched
    min_interval_secs: Option<u64>,
}

#[derive(Serialize)]
struct SensorInfo {
    name: String,
    kind: contracts::SensorKind,
    unit: &'static str,
    datasets: Vec<Dataset>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &CoordinatorBlueprint) -> ConfigInfo {
    let settings = &blueprint.coordinator;

    let barriers = Dataset::KNOWN
        .into_iter()
        .map(|dataset| BarrierInfo {
            dataset,
            min_interval_secs: blueprint
                .barriers
                .get(dataset)
                .map(|barrier| barrier.min_interval_secs),
        })
        .collect();

    let sensors = blueprint
        .sensors
        .iter()
        .map(|sensor| SensorInfo {
            name: sensor.name.clone(),
            kind: sensor.kind,
            unit: sensor.kind.unit(),
            datasets: sensor.kind.datasets().datasets().collect(),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        account: blueprint.account.label(),
        coordinator: SettingsInfo {
            update_interval_secs: settings.update_interval_secs,
            local_tz: settings.local_tz.clone(),
            historical_period_days: settings.historical_period_days,
            fetch_timeout_secs: settings.fetch_timeout().map(|t| t.as_secs()),
        },
        barriers,
        sensors,
        required_datasets: blueprint.required_datasets().datasets().collect(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               i-DE Coordinator Configuration                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("👤 Account");
    println!("   ├─ Version: {}", info.version);
    println!("   └─ Contract: {}", info.account);

    let settings = &info.coordinator;
    println!("\n⚙️  Coordinator");
    println!("   ├─ Update interval: {}s", settings.update_interval_secs);
    println!("   ├─ Local timezone: {}", settings.local_tz);
    println!("   ├─ Historical window: {} days", settings.historical_period_days);
    match settings.fetch_timeout_secs {
        Some(secs) => println!("   └─ Fetch timeout: {}s", secs),
        None => println!("   └─ Fetch timeout: none"),
    }

    println!("\n⏱  Barriers");
    for (i, barrier) in info.barriers.iter().enumerate() {
        let prefix = if i == info.barriers.len() - 1 { "└─" } else { "├─" };
        match barrier.min_interval_secs {
            Some(secs) => println!("   {} {}: every {}s", prefix, barrier.dataset, secs),
            None => println!("   {} {}: disabled", prefix, barrier.dataset),
        }
    }

    println!("\n📈 Sensors ({})", info.sensors.len());
    for (i, sensor) in info.sensors.iter().enumerate() {
        let prefix = if i == info.sensors.len() - 1 { "└─" } else { "├─" };
        let datasets: Vec<_> = sensor.datasets.iter().map(|d| d.name()).collect();
        println!(
            "   {} {} ({:?}, {}) <- {}",
            prefix,
            sensor.name,
            sensor.kind,
            sensor.unit,
            datasets.join(", ")
        );
    }

    let required: Vec<_> = info.required_datasets.iter().map(|d| d.name()).collect();
    if required.is_empty() {
        println!("\n📡 Required datasets: none");
    } else {
        println!("\n📡 Required datasets: {}", required.join(", "));
    }

    println!();
}
