//! Pidfile persistence for the daemon singleton record.
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, Once},
};

use tracing::warn;

use crate::error::PidFileError;

/// Path removed by the exit-time hook. Follows the most recent `write`; a
/// process only ever owns one pidfile.
static CLEANUP_PATH: Mutex<Option<PathBuf>> = Mutex::new(None);
static CLEANUP_HOOK: Once = Once::new();

/// Exit-time hook removing the registered pidfile. Runs inside `exit(3)`,
/// so it stays silent and best-effort.
extern "C" fn remove_registered_pidfile() {
    if let Ok(guard) = CLEANUP_PATH.lock()
        && let Some(path) = guard.as_ref()
    {
        let _ = fs::remove_file(path);
    }
}

/// On-disk record of the running daemon instance: a single decimal pid
/// terminated by a newline. Doubles as the singleton lock.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Creates a handle for the pidfile at `path`. No I/O happens here.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the pidfile path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the recorded pid.
    ///
    /// Returns `NotFound` if no pidfile exists and `Corrupt` if its content
    /// does not parse as a non-negative integer; the file is never modified.
    pub fn read(&self) -> Result<u32, PidFileError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(PidFileError::NotFound(self.path.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        contents
            .trim()
            .parse::<u32>()
            .map_err(|_| PidFileError::Corrupt {
                path: self.path.clone(),
                contents: contents.trim().to_string(),
            })
    }

    /// Records `pid` as the running instance and arms the exit-time cleanup.
    ///
    /// The cleanup removes the pidfile when the daemon process terminates
    /// through its normal exit path. It is a safety net; a controller-driven
    /// stop still removes the file explicitly.
    pub fn write(&self, pid: u32) -> Result<(), PidFileError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{pid}\n"))?;

        let mut registered = CLEANUP_PATH
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *registered = Some(self.path.clone());
        drop(registered);

        CLEANUP_HOOK.call_once(|| unsafe {
            libc::atexit(remove_registered_pidfile);
        });

        Ok(())
    }

    /// Removes the pidfile.
    ///
    /// Already-absent is treated as success so the daemon's exit cleanup and
    /// a controller stop can race without failing; the condition is still
    /// logged so operators can spot double removals.
    pub fn remove(&self) -> Result<(), PidFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("Pidfile {:?} was already removed", self.path);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
