//! Daemon lifecycle control: start, stop, and restart.
use std::thread;

use nix::{
    errno::Errno,
    sys::signal::{self, Signal},
    unistd::Pid,
};
use tracing::{info, warn};

use crate::{
    config::DaemonConfig,
    detach,
    error::{DaemonError, PidFileError, nix_error_to_io},
    pidfile::PidFile,
    probe,
};

/// Workload executed by the daemon process once fully detached.
///
/// `run` is the service body and is expected never to return under normal
/// operation; returning ends the daemon. Termination-signal handling is the
/// workload's responsibility (see [`crate::signals::register`]): a handler
/// that performs a clean exit also triggers the pidfile's exit-time cleanup.
pub trait Service {
    /// Entry point invoked in the daemon process after full detachment.
    fn run(&mut self);
}

/// Controller owning the lifecycle of one daemon identity.
pub struct Daemon<S> {
    config: DaemonConfig,
    pid_file: PidFile,
    service: S,
}

impl<S: Service> Daemon<S> {
    /// Creates a controller for `service` under the given identity.
    pub fn new(config: DaemonConfig, service: S) -> Self {
        let pid_file = PidFile::new(&config.pid_file);
        Self {
            config,
            pid_file,
            service,
        }
    }

    /// Returns the identity this controller manages.
    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Starts the daemon.
    ///
    /// Refuses with `AlreadyRunning` whenever a pid is recorded, whether or
    /// not that pid is still alive: a stale record left by an unclean crash
    /// needs operator attention, not a silent takeover. Otherwise the calling
    /// process detaches (the controller and the intermediate fork both exit
    /// with status 0) and only the final daemon process reaches the workload,
    /// so `start` returns solely in that process, once `run` finishes.
    pub fn start(&mut self) -> Result<(), DaemonError> {
        match self.pid_file.read() {
            Ok(pid) => {
                return Err(DaemonError::AlreadyRunning {
                    pid,
                    pid_file: self.config.pid_file.clone(),
                });
            }
            Err(PidFileError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        detach::detach(&self.config, &self.pid_file)?;
        self.service.run();
        Ok(())
    }

    /// Stops the daemon recorded in the pidfile.
    ///
    /// Delivers `SIGTERM` once per poll interval while the process is
    /// observed alive, then one final unconditional `SIGTERM` to cover the
    /// window between the last probe and loop exit. "No such process" at any
    /// point means the daemon already terminated and counts as success.
    /// Returns the number of termination attempts for observability.
    pub fn stop(&self) -> Result<u32, DaemonError> {
        let pid = match self.pid_file.read() {
            Ok(pid) => pid,
            Err(PidFileError::NotFound(path)) => {
                return Err(DaemonError::NotRunning { pid_file: path });
            }
            // Malformed or unreadable records are surfaced as-is; the file
            // is left in place for inspection.
            Err(err) => return Err(err.into()),
        };

        let target = Pid::from_raw(pid as i32);
        let mut attempts: u32 = 0;

        while probe::is_alive(pid) {
            if attempts >= self.config.max_stop_attempts {
                warn!("Pid {pid} survived {attempts} SIGTERMs; giving up");
                return Err(DaemonError::StopTimedOut { pid, attempts });
            }

            send_term(target, pid)?;
            attempts += 1;
            thread::sleep(self.config.stop_poll_interval());
        }

        // The process may have died between the last probe and loop exit in
        // a still-signalable state; one final SIGTERM covers that window.
        send_term(target, pid)?;

        info!("Daemon (pid {pid}) stopped after {attempts} termination attempts");
        self.pid_file.remove()?;
        Ok(attempts)
    }

    /// Restarts the daemon: stop followed by start.
    ///
    /// A missing pidfile is not an obstacle; the restart then degrades to a
    /// plain start. Every other stop failure propagates, since starting on
    /// top of a daemon that refused to die would break the singleton.
    pub fn restart(&mut self) -> Result<(), DaemonError> {
        match self.stop() {
            Ok(_) => {}
            Err(DaemonError::NotRunning { pid_file }) => {
                warn!("No pidfile at {pid_file:?}; treating restart as a plain start");
            }
            Err(err) => return Err(err),
        }

        self.start()
    }
}

/// Delivers `SIGTERM` to `target`, treating an already-gone process as
/// success. Any other delivery failure is fatal for the stop sequence and
/// leaves the pidfile untouched.
fn send_term(target: Pid, pid: u32) -> Result<(), DaemonError> {
    match signal::kill(target, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(err) => Err(DaemonError::SignalDelivery {
            pid,
            source: nix_error_to_io(err),
        }),
    }
}
