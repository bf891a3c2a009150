// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # tokenvest
//!
//! Entry point for the `tokenvest` binary. Parses CLI arguments, initializes
//! logging, and dispatches to the subcommands:
//!
//! - `simulate` replays a scenario file against an in-memory engine
//! - `quote`    evaluates one set of schedule terms at an instant
//! - `config`   prints the effective engine configuration
//! - `version`  prints build version information
//!
//! Reports go to stdout as JSON; logs go to stderr.

mod cli;
mod logging;
mod metrics;
mod scenario;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::json;

use tokenvest_engine::calculator::{
    cliff_end, effective_start, unlocked_amount, vested_amount, vesting_end,
};
use tokenvest_engine::constants::SECONDS_PER_DAY;
use tokenvest_engine::{EngineConfig, ScheduleTerms};

use cli::{Commands, ConfigSource, TokenvestCli};
use metrics::EngineMetrics;
use scenario::Scenario;

fn main() -> Result<()> {
    let cli = TokenvestCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Simulate(args) => simulate(args),
        Commands::Quote(args) => quote(args),
        Commands::Config(args) => show_config(&args.source),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads the configuration file if one was given, otherwise the defaults.
fn load_config(source: &ConfigSource) -> Result<EngineConfig> {
    match &source.config {
        Some(path) => {
            let config = EngineConfig::load(path)
                .with_context(|| format!("failed to load config: {}", path.display()))?;
            tracing::info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn simulate(args: cli::SimulateArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let scenario = Scenario::load(&args.scenario)?;
    let result = scenario::run(&scenario, &config)?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if args.metrics {
        let metrics = EngineMetrics::new().context("failed to create metrics registry")?;
        metrics.observe_report(&result.report);
        metrics.releases_total.inc_by(result.releases);
        print!("{}", metrics.encode().context("failed to encode metrics")?);
    }

    let failed = result.failed_steps();
    if args.strict && failed > 0 {
        bail!("{failed} of {} scenario steps failed", result.steps.len());
    }
    Ok(())
}

fn quote(args: cli::QuoteArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let global = config.global_vesting_start;
    let at = args.at.unwrap_or_else(Utc::now);

    let days = |d: u64| {
        d.checked_mul(SECONDS_PER_DAY)
            .with_context(|| format!("{d} days is out of range"))
    };
    let terms = ScheduleTerms {
        total_amount: args.amount,
        start: args.start,
        cliff_secs: days(args.cliff_days)?,
        duration_secs: days(args.duration_days)?,
        category: args.category,
    };
    terms.validate()?;
    if args.released > terms.total_amount {
        bail!(
            "released amount {} exceeds the schedule total {}",
            args.released,
            terms.total_amount
        );
    }

    let report = json!({
        "at": at,
        "category": terms.category,
        "total_amount": terms.total_amount,
        "effective_start": effective_start(&terms, global),
        "cliff_end": cliff_end(&terms, global),
        "vesting_end": vesting_end(&terms, global),
        "vested": vested_amount(&terms, global, at),
        "released": args.released,
        "releasable": unlocked_amount(&terms, global, at).saturating_sub(args.released),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn show_config(source: &ConfigSource) -> Result<()> {
    let config = load_config(source)?;
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

/// Prints version and build information.
fn print_version() {
    println!("tokenvest        {}", env!("CARGO_PKG_VERSION"));
    println!("tokenvest-engine {}", tokenvest_engine::VERSION);
    println!("rustc            {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
