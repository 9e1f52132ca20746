use std::fs::OpenOptions;

use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::config::Config;

/// Route log output to the configured file.
///
/// The terminal belongs to the form while it runs, so nothing is written to
/// stderr. `tracing` call sites reach this logger through its `log` feature.
pub fn init(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("cannot open log file {}", config.log_path))?;

    Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_filters(&config.log_level)
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;

    Ok(())
}
