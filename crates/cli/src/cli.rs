//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// i-DE coordinator - periodic energy data refresh
#[derive(Parser, Debug)]
#[command(
    name = "ide-coordinator",
    author,
    version,
    about = "Periodic refresh orchestrator for i-DE home energy data",
    long_about = "Polls i-DE metering datasets on a fixed interval, rate-limited per \n\
                  dataset, and publishes the merged snapshot to registered sensors.\n\n\
                  Runs against a simulated backend."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        env = "IDE_COORDINATOR_VERBOSE"
    )]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "IDE_COORDINATOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the coordinator on its update interval
    Run(RunArgs),

    /// Run a single forced refresh and print the snapshot
    Refresh(RefreshArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "coordinator.toml",
        env = "IDE_COORDINATOR_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the update interval from configuration (seconds)
    #[arg(long, env = "IDE_COORDINATOR_INTERVAL")]
    pub interval: Option<u64>,

    /// Stop after this many ticks (0 = unlimited)
    #[arg(long, default_value = "0", env = "IDE_COORDINATOR_MAX_TICKS")]
    pub max_ticks: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "IDE_COORDINATOR_TIMEOUT")]
    pub timeout: u64,

    /// Datasets the simulated backend fails on (comma separated)
    #[arg(long, default_value = "none")]
    pub fail: String,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "IDE_COORDINATOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `refresh` command
#[derive(Parser, Debug)]
pub struct RefreshArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "coordinator.toml")]
    pub config: PathBuf,

    /// Datasets to refresh (comma separated names, `all` or `none`)
    #[arg(short, long, default_value = "all")]
    pub datasets: String,

    /// Tick time (RFC 3339, must be UTC). Defaults to the current time.
    #[arg(long)]
    pub now: Option<String>,

    /// Output the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "coordinator.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "coordinator.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
