//! Daemon configuration from environment variables

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    /// Directory the run reports are written to (default: data)
    pub output_dir: PathBuf,

    /// Stations resolved concurrently (default: 1, sequential)
    pub workers: usize,

    /// Wall-clock budget for one run; stations left over are not attempted
    pub run_deadline: Option<Duration>,

    /// Pause between runs; `None` runs once and exits
    pub run_interval: Option<Duration>,
}

impl DaemonConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let output_dir = lookup("XEMA_OUTPUT_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "data".to_string())
            .into();

        let workers: usize = lookup("XEMA_WORKERS")
            .unwrap_or_else(|| "1".to_string())
            .trim()
            .parse()
            .context("Invalid XEMA_WORKERS")?;

        let run_deadline = seconds(&lookup, "XEMA_RUN_DEADLINE_SECS")?;
        let run_interval = seconds(&lookup, "XEMA_RUN_INTERVAL_SECS")?;

        Ok(Self {
            output_dir,
            workers: workers.max(1),
            run_deadline,
            run_interval,
        })
    }
}

/// Optional positive number of seconds; 0 or unset means none
fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid {key}"))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
