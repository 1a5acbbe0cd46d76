//! Best-effort SIGINT handling: flips a flag the drivers poll between
//! regions/lines, so a killed run still reaches the end of its current
//! iteration and lets `process::Target`'s `Drop` issue detach instead of
//! leaving the target stopped until the kernel reaps the tracer.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_: i32) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Installs the handler. Call once from `main`, before attach. Installation
/// itself is best-effort: if `sigaction` fails, the tool still runs, just
/// without a graceful-winddown path on SIGINT.
pub fn install() {
    let action = SigAction::new(SigHandler::Handler(handle_sigint), SaFlags::empty(), SigSet::empty());
    // SAFETY: the handler only performs an atomic store, which is async-signal-safe.
    let result = unsafe { signal::sigaction(Signal::SIGINT, &action) };
    if let Err(e) = result {
        log::warn!("could not install SIGINT handler: {}", e);
    }
}

/// True once SIGINT has been delivered since `install`.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
