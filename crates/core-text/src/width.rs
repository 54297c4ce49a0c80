//! Visual width and wrap geometry.
//!
//! Width Models:
//! - `Utf8Heuristic` (default): 2 columns for code points that need 4 bytes in
//!   UTF-8 (supplementary planes: most emoji, CJK extension B+), 1 otherwise.
//!   Cheap and stable; misses BMP wide glyphs such as common CJK ideographs.
//! - `UnicodeTable`: East Asian Width via `unicode-width`, with every code point
//!   clamped to at least 1 column.
//!
//! Invariants (both models):
//! - `width(s) >= s.len()`: every code point contributes at least one column.
//! - Width is a pure function of the sequence; wrap counts depend only on the
//!   width and the column count passed in for the current frame.

use serde::Deserialize;
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidthModel {
    #[default]
    Utf8Heuristic,
    UnicodeTable,
}

impl WidthModel {
    /// Column width of one code point under this model.
    pub fn char_width(self, c: char) -> usize {
        match self {
            WidthModel::Utf8Heuristic => {
                if c.len_utf8() > 3 {
                    2
                } else {
                    1
                }
            }
            // Controls and zero-width marks report 0/None; clamp so the
            // per-code-point minimum still holds.
            WidthModel::UnicodeTable => c.width().unwrap_or(1).max(1),
        }
    }

    pub fn width(self, seq: &[char]) -> usize {
        seq.iter().map(|&c| self.char_width(c)).sum()
    }
}

/// Visual width under the default model.
pub fn visual_width(seq: &[char]) -> usize {
    WidthModel::Utf8Heuristic.width(seq)
}

/// Physical screen lines needed to show `width` columns at `columns` per line.
///
/// Zero width needs zero lines. A zero column count is clamped to 1 rather
/// than treated as an error.
pub fn line_count(width: usize, columns: usize) -> usize {
    width.div_ceil(columns.max(1))
}
