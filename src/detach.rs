//! Double-fork detachment sequence.
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    os::unix::io::AsRawFd,
    path::Path,
    process,
};

use nix::unistd::{self, ForkResult};
use tracing::{error, info};

use crate::{
    config::DaemonConfig,
    error::{DaemonError, nix_error_to_io},
    pidfile::PidFile,
};

/// Turns the calling process into a detached daemon.
///
/// Performs the classic double fork: the original (controller) process and
/// the intermediate session leader both exit with status 0, so this function
/// returns only in the final daemon process, with the pidfile written and
/// the standard streams rebound to the configured targets. A failed fork is
/// unrecoverable and terminates the calling process with status 1.
pub fn detach(config: &DaemonConfig, pid_file: &PidFile) -> Result<(), DaemonError> {
    // First fork. The parent is the controller; it has no further
    // responsibility and exits immediately.
    fork_or_exit("first");

    // Sever the controlling terminal, stop pinning the caller's working
    // directory, and drop its file-mode creation mask.
    unistd::setsid().map_err(|err| DaemonError::Detach(nix_error_to_io(err)))?;
    std::env::set_current_dir("/").map_err(DaemonError::Detach)?;
    unsafe {
        libc::umask(0);
    }

    // Second fork. The intermediate exits; the grandchild is no session
    // leader and can never reacquire a controlling terminal.
    fork_or_exit("second");

    // The singleton record must exist before the workload can run, and the
    // write also arms the pidfile's exit-time cleanup.
    pid_file.write(process::id())?;

    redirect_streams(config)?;

    info!("Daemonised with pid {}", process::id());
    Ok(())
}

/// Forks, exiting the parent with status 0.
fn fork_or_exit(stage: &str) {
    match unsafe { unistd::fork() } {
        Ok(ForkResult::Parent { .. }) => process::exit(0),
        Ok(ForkResult::Child) => {}
        Err(err) => {
            error!("Error while daemonising ({stage} fork): {err}");
            process::exit(1);
        }
    }
}

/// Rebinds stdin, stdout, and stderr to the configured paths. All three are
/// bound before the workload runs, since it may write to any of them.
fn redirect_streams(config: &DaemonConfig) -> Result<(), DaemonError> {
    // Flush whatever is still buffered for the inherited descriptors.
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    let stdin =
        File::open(&config.stdin).map_err(|source| DaemonError::StreamRedirect {
            path: config.stdin.clone(),
            source,
        })?;
    let stdout = open_sink(&config.stdout)?;
    let stderr = open_sink(&config.stderr)?;

    rebind(&stdin, libc::STDIN_FILENO, &config.stdin)?;
    rebind(&stdout, libc::STDOUT_FILENO, &config.stdout)?;
    rebind(&stderr, libc::STDERR_FILENO, &config.stderr)
}

fn open_sink(path: &Path) -> Result<File, DaemonError> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|source| DaemonError::StreamRedirect {
            path: path.to_path_buf(),
            source,
        })
}

fn rebind(file: &File, target_fd: libc::c_int, path: &Path) -> Result<(), DaemonError> {
    if unsafe { libc::dup2(file.as_raw_fd(), target_fd) } < 0 {
        return Err(DaemonError::StreamRedirect {
            path: path.to_path_buf(),
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}
