//! Window geometry probe.
//!
//! Each call issues exactly one `TIOCGWINSZ` query; sizes are never cached
//! because the window can be resized between any two calls.

use crate::error::TerminalError;
use rustix::fd::AsFd;
use rustix::termios;
use tracing::debug;

/// Width assumed when the terminal cannot report its geometry.
pub const DEFAULT_COLUMNS: u16 = 80;

/// Snapshot of a terminal window. Pixel fields are zero when the terminal does
/// not report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub rows: u16,
    pub columns: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

/// Query the current window size of `fd`.
///
/// # Errors
///
/// `GeometryUnavailable` when the query is unsupported (non-tty, detached
/// controlling terminal) or the device reports zero columns.
pub fn current_size<Fd: AsFd>(fd: Fd) -> Result<WindowSize, TerminalError> {
    let ws = termios::tcgetwinsize(fd)
        .map_err(|source| TerminalError::GeometryUnavailable {
            source: Some(source),
        })?;
    if ws.ws_col == 0 {
        return Err(TerminalError::GeometryUnavailable { source: None });
    }
    Ok(WindowSize {
        rows: ws.ws_row,
        columns: ws.ws_col,
        pixel_width: ws.ws_xpixel,
        pixel_height: ws.ws_ypixel,
    })
}

/// Current column count of `fd`, or `fallback` (clamped to at least 1) when the
/// geometry is unavailable.
pub fn columns_or<Fd: AsFd>(fd: Fd, fallback: u16) -> u16 {
    match current_size(fd) {
        Ok(size) => size.columns,
        Err(err) => {
            let fallback = fallback.max(1);
            debug!(target: "terminal.geometry", %err, fallback, "geometry_fallback");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_file_has_no_geometry() {
        let file = tempfile::tempfile().unwrap();
        let err = current_size(&file).unwrap_err();
        assert!(matches!(err, TerminalError::GeometryUnavailable { source: Some(_) }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn columns_or_falls_back_to_default() {
        let file = tempfile::tempfile().unwrap();
        assert_eq!(columns_or(&file, DEFAULT_COLUMNS), 80);
        assert_eq!(columns_or(&file, 132), 132);
    }

    #[test]
    fn zero_fallback_is_clamped() {
        let file = tempfile::tempfile().unwrap();
        assert_eq!(columns_or(&file, 0), 1);
    }
}
