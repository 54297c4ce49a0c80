use rustix::io::Errno;
use thiserror::Error;

/// Failures surfaced by terminal control-channel operations.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The handle is a file, pipe or socket rather than a tty.
    #[error("handle is not a terminal")]
    NotATerminal,
    /// The device rejected an attribute query or update.
    #[error("terminal {op} failed: {source}")]
    Config {
        op: &'static str,
        #[source]
        source: Errno,
    },
    /// Window geometry could not be queried. Recoverable: callers fall back to a
    /// configured default width.
    #[error("terminal geometry unavailable")]
    GeometryUnavailable {
        #[source]
        source: Option<Errno>,
    },
}

impl TerminalError {
    pub(crate) fn config(op: &'static str) -> impl FnOnce(Errno) -> Self {
        move |source| TerminalError::Config { op, source }
    }

    /// True for errors the interactive loop may survive (geometry only).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TerminalError::GeometryUnavailable { .. })
    }
}
