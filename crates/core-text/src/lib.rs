//! Pure text primitives over code-point sequences (`&[char]`): display width,
//! wrap line counts, sequence search and word boundaries.
//!
//! Nothing here touches the terminal; callers pass in the column count they
//! probed for the current frame.

pub mod search;
pub mod width;
pub mod word;

pub use search::{find_backward, find_forward, sequences_equal};
pub use width::{WidthModel, line_count, visual_width};
pub use word::is_word_break;
