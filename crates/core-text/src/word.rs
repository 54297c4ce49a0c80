//! Word boundaries for word-wise motions.
//!
//! Only ASCII letters form words; digits, punctuation, whitespace and all
//! non-ASCII code points are breaks.

pub fn is_word_break(c: char) -> bool {
    !c.is_ascii_alphabetic()
}

/// Start of the word at or before `idx` (Meta-b target). Skips breaks first,
/// then word characters.
pub fn word_start_before(seq: &[char], idx: usize) -> usize {
    let mut i = idx.min(seq.len());
    while i > 0 && is_word_break(seq[i - 1]) {
        i -= 1;
    }
    while i > 0 && !is_word_break(seq[i - 1]) {
        i -= 1;
    }
    i
}

/// End of the word at or after `idx` (Meta-f / Meta-d target).
pub fn word_end_after(seq: &[char], idx: usize) -> usize {
    let mut i = idx.min(seq.len());
    while i < seq.len() && is_word_break(seq[i]) {
        i += 1;
    }
    while i < seq.len() && !is_word_break(seq[i]) {
        i += 1;
    }
    i
}
