//! # CLI Interface
//!
//! Defines the command-line argument structure for `tokenvest` using
//! `clap` derive. Supports four subcommands: `simulate`, `quote`, `config`,
//! and `version`.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokenvest_engine::AllocationCategory;

use crate::logging::LogFormat;

/// Token vesting engine driver.
///
/// Replays scenario files against an in-memory engine, quotes single
/// schedules, and prints the effective configuration.
#[derive(Parser, Debug)]
#[command(
    name = "tokenvest",
    about = "Token vesting engine driver",
    version,
    propagate_version = true
)]
pub struct TokenvestCli {
    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "TOKENVEST_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(
        long,
        global = true,
        default_value = "tokenvest=info,tokenvest_engine=info"
    )]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `tokenvest` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario file and print the outcome of every step.
    Simulate(SimulateArgs),
    /// Compute vested and releasable amounts for one set of terms.
    Quote(QuoteArgs),
    /// Print the effective engine configuration as JSON.
    Config(ConfigArgs),
    /// Print version information and exit.
    Version,
}

/// Engine configuration source shared by several subcommands.
#[derive(Args, Debug, Clone)]
pub struct ConfigSource {
    /// Path to the engine configuration file (JSON).
    ///
    /// When omitted, the built-in category caps and global start are used.
    #[arg(long, short = 'c', env = "TOKENVEST_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the scenario file (JSON).
    #[arg(long, short = 's')]
    pub scenario: PathBuf,

    #[command(flatten)]
    pub source: ConfigSource,

    /// Also print the final state in Prometheus text format.
    #[arg(long)]
    pub metrics: bool,

    /// Exit with an error if any step failed.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `quote` subcommand.
#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Total tokens in the schedule.
    #[arg(long)]
    pub amount: u64,

    /// Schedule start (RFC 3339). Defaults to the global vesting start.
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Cliff length in days.
    #[arg(long, default_value_t = 0)]
    pub cliff_days: u64,

    /// Vesting duration in days.
    #[arg(long)]
    pub duration_days: u64,

    /// Instant to evaluate at (RFC 3339). Defaults to the current time.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,

    /// Tokens already released.
    #[arg(long, default_value_t = 0)]
    pub released: u64,

    /// Allocation category (team, advisors, investors, ecosystem, treasury,
    /// community).
    #[arg(long, default_value = "team")]
    pub category: AllocationCategory,

    #[command(flatten)]
    pub source: ConfigSource,
}

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub source: ConfigSource,
}
