//! Non-destructive process liveness probe.
use nix::{sys::signal, unistd::Pid};
use tracing::debug;

/// Reports whether `pid` is alive by delivering the null signal.
///
/// Any delivery failure counts as "not running": `ESRCH` means the process
/// is gone, and `EPERM` (alive but not signalable by us) is folded into the
/// same answer since a pid we cannot signal is one we cannot stop either.
/// The result is a point-in-time observation; callers must tolerate the
/// process exiting right after a positive probe.
pub fn is_alive(pid: u32) -> bool {
    let target = Pid::from_raw(pid as i32);
    match signal::kill(target, None) {
        Ok(()) => true,
        Err(err) => {
            if err != nix::errno::Errno::ESRCH {
                debug!("Probe of pid {pid} failed with {err}; treating as not running");
            }
            false
        }
    }
}
