//! Terminal device primitives: raw-mode lifecycle and window geometry.
//!
//! Every operation takes a borrowed descriptor (`impl AsFd`); this crate never
//! owns the terminal except through an explicit `RawModeGuard`.

pub mod error;
pub mod geometry;
pub mod raw_mode;

pub use error::TerminalError;
pub use geometry::{DEFAULT_COLUMNS, WindowSize, columns_or, current_size};
pub use raw_mode::{RawModeGuard, RawModeState, enter_raw_mode, is_terminal, restore};
