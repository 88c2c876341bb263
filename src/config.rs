//! Configuration management for daemong.
use std::{env, fs, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

fn default_stop_poll_ms() -> u64 {
    100
}

fn default_max_stop_attempts() -> u32 {
    100
}

fn default_null_device() -> PathBuf {
    PathBuf::from("/dev/null")
}

/// Default pidfile location, under `$HOME/.local/share/daemong` with a
/// temp-dir fallback for HOME-less environments.
fn default_pid_file() -> PathBuf {
    let base = env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".local/share/daemong"))
        .unwrap_or_else(env::temp_dir);
    base.join("daemong.pid")
}

/// Identity and tuning of a single daemon instance.
///
/// Immutable for the life of a controller; every field can be supplied from
/// a YAML config file, with defaults for everything but ordinary overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Pidfile acting as the singleton record for this daemon identity.
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    /// Path bound to the daemon's stdin after detachment.
    #[serde(default = "default_null_device")]
    pub stdin: PathBuf,

    /// Path the daemon's stdout is appended to after detachment.
    #[serde(default = "default_null_device")]
    pub stdout: PathBuf,

    /// Path the daemon's stderr is appended to after detachment.
    #[serde(default = "default_null_device")]
    pub stderr: PathBuf,

    /// Milliseconds slept between termination attempts while stopping.
    #[serde(default = "default_stop_poll_ms")]
    pub stop_poll_ms: u64,

    /// Upper bound on termination attempts before a stop gives up.
    #[serde(default = "default_max_stop_attempts")]
    pub max_stop_attempts: u32,
}

impl DaemonConfig {
    /// Creates a config for the given pidfile path with `/dev/null` streams
    /// and default stop tuning.
    pub fn new(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
            stdin: default_null_device(),
            stdout: default_null_device(),
            stderr: default_null_device(),
            stop_poll_ms: default_stop_poll_ms(),
            max_stop_attempts: default_max_stop_attempts(),
        }
    }

    /// Interval the stop loop sleeps between termination attempts.
    pub fn stop_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stop_poll_ms)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::new(default_pid_file())
    }
}

/// Loads the daemon configuration from a YAML file.
///
/// Falls back to `daemong.yaml` in the current directory when no path is
/// given.
pub fn load_config(path: Option<&str>) -> Result<DaemonConfig, ConfigError> {
    let path = path.unwrap_or("daemong.yaml");
    debug!("Loading configuration from {path}");

    let contents = fs::read_to_string(path)?;
    let config: DaemonConfig = serde_yaml::from_str(&contents)?;
    Ok(config)
}
