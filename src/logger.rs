//! Logging setup for planboard.
//!
//! Builds a fern dispatch from [`LoggingConfig`]. Initialization is
//! idempotent; repeated calls after the first are no-ops.

use anyhow::{Context, Result};
use log::LevelFilter;
use once_cell::sync::OnceCell;

use crate::config::LoggingConfig;

static INITIALIZED: OnceCell<()> = OnceCell::new();

fn level_filter(level: &str) -> LevelFilter {
    match level {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initialize logging according to configuration.
///
/// With logging disabled, installs nothing; `log` macros become no-ops.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if !config.enabled || INITIALIZED.get().is_some() {
        return Ok(());
    }

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level_filter(&config.level));

    dispatch = match &config.file {
        Some(path) => dispatch.chain(fern::log_file(path).with_context(|| {
            format!("Failed to open log file: {}", path.display())
        })?),
        None => dispatch.chain(std::io::stderr()),
    };

    dispatch.apply().context("Logger already installed")?;
    let _ = INITIALIZED.set(());
    Ok(())
}
