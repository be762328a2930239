//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Race Engine - telemetry fusion and match lifecycle engine
#[derive(Parser, Debug)]
#[command(
    name = "race-engine",
    author,
    version,
    about = "Running/cycling match engine",
    long_about = "Telemetry fusion and match lifecycle engine for running and cycling\n\
                  competitions.\n\n\
                  Loads a match blueprint, collects phone and wearable telemetry,\n\
                  fuses it into 50 ms slots, runs the configured effects and scores\n\
                  the recorded path when the match ends."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RACE_ENGINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RACE_ENGINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulated match from a blueprint
    Run(RunArgs),

    /// Validate a blueprint file without running
    Validate(ValidateArgs),

    /// Display blueprint information
    Info(InfoArgs),

    /// Re-score a recorded match summary offline
    Score(ScoreArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to blueprint file (TOML or JSON)
    #[arg(short, long, default_value = "match.toml", env = "RACE_ENGINE_CONFIG")]
    pub config: PathBuf,

    /// Match timeout in seconds; the match is stopped when it expires
    /// (0 = run until the finish geofence or Ctrl+C)
    #[arg(long, default_value = "0", env = "RACE_ENGINE_TIMEOUT")]
    pub timeout: u64,

    /// Override the simulated athlete speed in m/s (0 = sport default)
    #[arg(long, default_value = "0.0", env = "RACE_ENGINE_SPEED")]
    pub speed: f64,

    /// Validate the blueprint and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for the wearable fan-in queue
    #[arg(long, default_value = "256", env = "RACE_ENGINE_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "RACE_ENGINE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Write the end-of-match summary as JSON to this path
    #[arg(short, long, env = "RACE_ENGINE_OUTPUT")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to blueprint file to validate
    #[arg(short, long, default_value = "match.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to blueprint file
    #[arg(short, long, default_value = "match.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed effect parameters
    #[arg(long)]
    pub effects: bool,
}

/// Arguments for the `score` command
#[derive(Parser, Debug)]
pub struct ScoreArgs {
    /// Recorded match summary JSON (as written by `run --output`)
    #[arg(short, long, env = "RACE_ENGINE_INPUT")]
    pub input: PathBuf,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
