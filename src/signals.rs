//! Signal handler registration for workload code.
use std::io;

use libc::c_int;
use signal_hook::{SigId, low_level};

/// Registers `handler` for `signal`, adapting it to the platform's
/// signal-handler call shape; the handler receives the delivered signal id.
///
/// Registration must happen before the signal of interest can be relied
/// upon; there is no queueing for signals delivered earlier. The handler
/// runs in signal context and must restrict itself to async-signal-safe
/// work.
///
/// # Errors
///
/// Fails if the OS rejects the registration (e.g. for forbidden signals
/// such as `SIGKILL`).
pub fn register<F>(signal: c_int, handler: F) -> io::Result<SigId>
where
    F: Fn(c_int) + Sync + Send + 'static,
{
    unsafe { low_level::register(signal, move || handler(signal)) }
}
