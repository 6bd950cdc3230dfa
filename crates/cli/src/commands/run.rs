//! `run` command implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{Consumer, CoordinatorBlueprint, DatasetKind};
use coordinator::{Scheduler, SchedulerConfig, SystemClock};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::session::{build_coordinator, LogListener, RunStats};

/// Execute the `run` command
pub async fn run_coordinator(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(interval) = args.interval {
        if interval == 0 {
            anyhow::bail!("--interval must be positive");
        }
        info!(interval_secs = interval, "Overriding update interval from CLI");
        blueprint.coordinator.update_interval_secs = interval;
    }

    let failing = DatasetKind::parse_list(&args.fail)
        .with_context(|| format!("Unknown dataset in --fail '{}'", args.fail))?;

    info!(
        account = %blueprint.account.label(),
        interval_secs = blueprint.coordinator.update_interval_secs,
        local_tz = %blueprint.coordinator.local_tz,
        gated = %blueprint.barriers.gated(),
        sensors = blueprint.sensors.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::install_prometheus(args.metrics_port)
            .context("Failed to start metrics exporter")?;
    }

    let (coordinator, sensors) = build_coordinator(&blueprint, failing)?;
    let listener = Arc::new(LogListener::new(sensors.clone()));

    let config = SchedulerConfig {
        update_interval: blueprint.coordinator.update_interval(),
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
        clock: Arc::new(SystemClock),
        ..Default::default()
    };
    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));

    info!(?config, "Starting scheduler...");
    let started = Instant::now();
    let handle = Scheduler::spawn(coordinator, listener, config);

    let shutdown_signal = setup_shutdown_signal();
    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = handle.finished() => {
            info!("Scheduler reached its tick limit");
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping scheduler...");
        }
        _ = deadline => {
            warn!(timeout_secs = args.timeout, "Run timeout reached, stopping scheduler...");
        }
    }

    let (coordinator, scheduler) = handle
        .shutdown()
        .await
        .context("Scheduler did not stop cleanly")?;

    let stats = RunStats {
        duration: started.elapsed(),
        scheduler,
        snapshot: coordinator.data().clone(),
    };

    info!(
        ticks = stats.scheduler.ticks,
        failures = stats.scheduler.failures,
        duration_secs = stats.duration.as_secs_f64(),
        "Coordinator stopped"
    );
    stats.print_summary(&sensors);

    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &CoordinatorBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Account: {}", blueprint.account.label());
    println!(
        "Coordinator: every {}s, {} day window, zone {}",
        blueprint.coordinator.update_interval_secs,
        blueprint.coordinator.historical_period_days,
        blueprint.coordinator.local_tz
    );

    println!("\nBarriers:");
    for dataset in contracts::Dataset::KNOWN {
        match blueprint.barriers.get(dataset) {
            Some(barrier) => println!("  - {dataset}: {}s", barrier.min_interval_secs),
            None => println!("  - {dataset}: disabled"),
        }
    }

    let sensors = coordinator::sensors_from_blueprint(blueprint);
    println!("\nSensors ({}):", sensors.len());
    for sensor in &sensors {
        println!("  - {} ({})", sensor.name(), sensor.datasets());
    }
    println!();
}
