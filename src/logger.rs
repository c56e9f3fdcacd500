//! Logging setup for applications embedding the repository.
//!
//! The library itself only emits records through the `log` facade. Calling
//! [`init`] installs a `fern` dispatcher that writes them to stderr and,
//! when enabled, to a log file.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::LevelFilter;

use crate::config::LoggingConfig;
use crate::constants::{APP_DIR_NAME, LOG_FILE_NAME, LOG_TIMESTAMP_FORMAT};

/// Map a level name such as `"debug"` to a [`LevelFilter`]. Case-insensitive.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level.trim()).map_err(|_| {
        anyhow::anyhow!(
            "Unknown log level '{}' (expected off, error, warn, info, debug or trace)",
            level
        )
    })
}

/// Get the log file path in the user's data directory
pub fn get_log_file_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join(APP_DIR_NAME).join(LOG_FILE_NAME))
}

/// Level that [`init`] installs for `config`.
///
/// With logging disabled only warnings and errors reach stderr.
pub fn effective_level(config: &LoggingConfig) -> Result<LevelFilter> {
    if config.enabled {
        parse_level(&config.level)
    } else {
        Ok(LevelFilter::Warn)
    }
}

/// Install the global logger.
///
/// # Errors
/// Fails when the level is unknown, the log file cannot be opened, or a
/// global logger is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = effective_level(config)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {:<5} {}: {}",
                chrono::Local::now().format(LOG_TIMESTAMP_FORMAT),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if config.enabled {
        let path = match &config.file {
            Some(path) => path.clone(),
            None => get_log_file_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = fern::log_file(&path).with_context(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().context("Failed to install logger")?;
    Ok(())
}
