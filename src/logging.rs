//! Tracing setup.
//!
//! The full-screen UI owns the terminal, so it logs to a file. One-shot
//! commands log to stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "MOODMATE_LOG";

static INIT: OnceCell<()> = OnceCell::new();

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
}

/// Build the filter from `MOODMATE_LOG`, falling back to `default_level`
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(target: LogTarget<'_>, default_level: &str) -> Result<()> {
    INIT.get_or_try_init(|| {
        let filter = env_filter(default_level);
        match target {
            LogTarget::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).context("Failed to create log directory")?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?;
                fmt()
                    .with_env_filter(filter)
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            LogTarget::Stderr => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
        }
        Ok::<(), anyhow::Error>(())
    })?;
    Ok(())
}
