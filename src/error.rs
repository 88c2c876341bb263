//! Error handling for daemong.
use std::path::PathBuf;

use thiserror::Error;

/// Defines all possible errors that can occur while controlling a daemon.
///
/// Fork failures are deliberately absent: a failed `fork` leaves no safe
/// continuation, so the detach sequence reports the OS error and terminates
/// the calling process instead of returning.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// A pidfile already exists, so another instance is presumed running.
    #[error("pidfile {pid_file:?} already exists (pid {pid}); daemon already running?")]
    AlreadyRunning {
        /// The pid recorded in the existing pidfile.
        pid: u32,
        /// Path of the pidfile that blocked the start.
        pid_file: PathBuf,
    },

    /// No pidfile exists, so there is nothing to stop.
    #[error("pidfile {pid_file:?} does not exist; daemon not running")]
    NotRunning {
        /// Path of the missing pidfile.
        pid_file: PathBuf,
    },

    /// Error detaching from the controlling session after the first fork.
    #[error("failed to detach from the controlling session: {0}")]
    Detach(#[source] std::io::Error),

    /// Error rebinding a standard stream to its configured target.
    #[error("failed to redirect standard stream to {path:?}: {source}")]
    StreamRedirect {
        /// The stream target that could not be bound.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Error delivering the termination signal during stop.
    #[error("failed to deliver SIGTERM to pid {pid}: {source}")]
    SignalDelivery {
        /// The pid the signal was addressed to.
        pid: u32,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The stopped process outlived the configured termination attempts.
    #[error("pid {pid} still alive after {attempts} termination attempts")]
    StopTimedOut {
        /// The pid that refused to die.
        pid: u32,
        /// Number of SIGTERMs sent before giving up.
        attempts: u32,
    },

    /// Error reading, writing, or removing the pidfile.
    #[error("pidfile error: {0}")]
    PidFile(#[from] PidFileError),
}

/// Error type for pidfile operations.
#[derive(Debug, Error)]
pub enum PidFileError {
    /// The pidfile does not exist.
    #[error("pidfile {0:?} does not exist")]
    NotFound(PathBuf),

    /// The pidfile content is not a parseable process id.
    #[error("pidfile {path:?} holds unparseable content {contents:?}")]
    Corrupt {
        /// Path of the malformed pidfile, left untouched for inspection.
        path: PathBuf,
        /// The offending content.
        contents: String,
    },

    /// Error accessing the pidfile.
    #[error("failed to access pidfile: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading or accessing a configuration file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Converts a nix errno into a `std::io::Error` usable as an error source.
pub(crate) fn nix_error_to_io(err: nix::errno::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(err as i32)
}
