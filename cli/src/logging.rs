//! # Logging
//!
//! One `tracing` subscriber for the whole process. Output goes to stderr,
//! leaving stdout for the JSON the subcommands print. `RUST_LOG` wins over
//! `--log-level` when both are set.

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Shape of each log line on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs the global subscriber. Fails if one is already installed or
/// `default_level` is not a valid filter.
pub fn init_logging(default_level: &str, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => fallback_filter(default_level)?,
    };

    // Exactly one of these is `Some`; a `None` layer is a no-op.
    let pretty = (format == LogFormat::Pretty)
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(true));
    let json = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
        .context("a tracing subscriber is already installed")?;

    tracing::debug!(?format, "logging ready");
    Ok(())
}

fn fallback_filter(default_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(default_level)
        .with_context(|| format!("invalid log filter {default_level:?}"))
}
