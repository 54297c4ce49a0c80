//! Raw-mode enter/restore on an arbitrary terminal descriptor.
//!
//! Raw mode here means `cfmakeraw` semantics: no canonical line buffering, no
//! echo, no signal-generating control characters, VMIN=1 / VTIME=0.
//!
//! Ownership contract:
//! * `enter_raw_mode` captures the prior attributes into a `RawModeState`.
//! * `restore` consumes that state, so a snapshot cannot be applied twice.
//! * `RawModeGuard` bundles the descriptor and state and restores on drop,
//!   covering early returns and panics. Entering twice on the same handle
//!   without restoring in between is a caller contract violation and is not
//!   arbitrated here.

use crate::error::TerminalError;
use rustix::fd::AsFd;
use rustix::termios::{self, OptionalActions, Termios};
use tracing::{debug, warn};

/// Prior terminal attributes captured on entry to raw mode. Single use.
#[derive(Debug)]
#[must_use = "raw mode stays active until this state is restored"]
pub struct RawModeState {
    original: Termios,
}

impl RawModeState {
    /// Attributes as they were before raw mode was entered.
    pub fn original(&self) -> &Termios {
        &self.original
    }
}

/// Pure tty predicate. Files and pipes yield `false`; never fails.
pub fn is_terminal<Fd: AsFd>(fd: Fd) -> bool {
    termios::isatty(fd)
}

/// Switch `fd` into raw mode and return the attributes it had before.
///
/// # Errors
///
/// `NotATerminal` when `fd` is not a tty, `Config` when the attribute query or
/// update is rejected by the device.
pub fn enter_raw_mode<Fd: AsFd>(fd: Fd) -> Result<RawModeState, TerminalError> {
    let fd = fd.as_fd();
    if !termios::isatty(fd) {
        return Err(TerminalError::NotATerminal);
    }
    let original = termios::tcgetattr(fd).map_err(TerminalError::config("tcgetattr"))?;
    let mut raw = original.clone();
    raw.make_raw();
    termios::tcsetattr(fd, OptionalActions::Now, &raw)
        .map_err(TerminalError::config("tcsetattr"))?;
    debug!(target: "terminal.raw_mode", "entered");
    Ok(RawModeState { original })
}

/// Reapply the attributes captured by `enter_raw_mode`.
///
/// Callers treat this as best-effort cleanup and attempt it on every exit path,
/// including after a failed edit session.
///
/// # Errors
///
/// `Config` when the device rejects the update.
pub fn restore<Fd: AsFd>(fd: Fd, state: RawModeState) -> Result<(), TerminalError> {
    termios::tcsetattr(fd, OptionalActions::Now, &state.original)
        .map_err(TerminalError::config("tcsetattr"))?;
    debug!(target: "terminal.raw_mode", "restored");
    Ok(())
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct RawModeGuard<F: AsFd> {
    fd: F,
    state: Option<RawModeState>,
}

impl<F: AsFd> RawModeGuard<F> {
    /// Enter raw mode on `fd` and hold it until the guard is dropped.
    ///
    /// # Errors
    ///
    /// Same as [`enter_raw_mode`].
    pub fn enter(fd: F) -> Result<Self, TerminalError> {
        let state = enter_raw_mode(fd.as_fd())?;
        Ok(Self {
            fd,
            state: Some(state),
        })
    }

    /// The guarded descriptor (still in raw mode).
    pub fn fd(&self) -> &F {
        &self.fd
    }

    /// Restore explicitly, surfacing any failure instead of logging it.
    ///
    /// # Errors
    ///
    /// Same as [`restore`].
    pub fn restore(mut self) -> Result<(), TerminalError> {
        match self.state.take() {
            Some(state) => restore(self.fd.as_fd(), state),
            None => Ok(()),
        }
    }
}

impl<F: AsFd> Drop for RawModeGuard<F> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            if let Err(err) = restore(self.fd.as_fd(), state) {
                warn!(target: "terminal.raw_mode", %err, "restore_on_drop_failed");
            }
        }
    }
}

impl<F: AsFd> std::fmt::Debug for RawModeGuard<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawModeGuard")
            .field("active", &self.state.is_some())
            .finish()
    }
}
