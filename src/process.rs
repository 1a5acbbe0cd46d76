//! Process attach controller: attach to a target, block until it stops, and
//! guarantee detach on every return path, including panics, by modeling the
//! attached state as a scope guard.

use nix::sys::ptrace;
use nix::sys::wait::waitpid;
use nix::unistd::Pid;

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("ptrace(ATTACH) on pid {0}: {1}")]
    Ptrace(i32, nix::Error),
    #[error("waitpid on pid {0}: {1}")]
    Wait(i32, nix::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("ptrace(DETACH) on pid {0}: {1}")]
pub struct DetachError(pub i32, pub nix::Error);

/// Exclusive tracing control over a target process, held from a successful
/// `attach` until `detach` (explicit, or implicit via `Drop`).
///
/// Invariant: once `Target::attach` returns `Ok`, the target is stopped and
/// stays stopped until exactly one detach is issued. Every return path out
/// of a driver — success, `?`-propagated error, or panic — runs through
/// `Drop::drop`, so the kernel regains control of the target even if the
/// caller never calls `detach` explicitly.
pub struct Target {
    pid: Pid,
    detached: bool,
}

impl Target {
    pub fn attach(pid: Pid) -> Result<Self, AttachError> {
        ptrace::attach(pid).map_err(|e| AttachError::Ptrace(pid.as_raw(), e))?;
        waitpid(pid, None).map_err(|e| AttachError::Wait(pid.as_raw(), e))?;
        log::info!("attached to pid {}", pid);
        Ok(Self {
            pid,
            detached: false,
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Detaches explicitly, surfacing a `DetachError` to the caller. After
    /// this call `Drop` is a no-op, so detach is never issued twice.
    pub fn detach(mut self) -> Result<(), DetachError> {
        self.detach_once()
    }

    fn detach_once(&mut self) -> Result<(), DetachError> {
        if self.detached {
            return Ok(());
        }
        self.detached = true;
        ptrace::detach(self.pid, None).map_err(|e| DetachError(self.pid.as_raw(), e))?;
        log::info!("detached from pid {}", self.pid);
        Ok(())
    }
}

impl Drop for Target {
    fn drop(&mut self) {
        if let Err(e) = self.detach_once() {
            log::warn!("{} (suppressed: a prior error already determined the exit code)", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_to_nonexistent_pid_fails() {
        // PIDs this large are never valid on Linux (pid_max caps well below
        // i32::MAX), so this should reliably fail attach without needing a
        // real target process.
        let bogus = Pid::from_raw(i32::MAX - 1);
        assert!(Target::attach(bogus).is_err());
    }
}
