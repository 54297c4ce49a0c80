//! Exact code-point sequence search for incremental history search.
//!
//! Naive O(haystack × needle) scans; history lines and queries are short.
//! Empty needle: found at 0 scanning forward, at `haystack.len()` scanning
//! backward (found immediately from either end).

/// Lowest start index of `needle` in `haystack`.
pub fn find_forward(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(0);
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| sequences_equal(&haystack[i..i + needle.len()], needle))
}

/// Highest start index of `needle` in `haystack`.
pub fn find_backward(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(haystack.len());
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| sequences_equal(&haystack[i..i + needle.len()], needle))
}

/// Exact equality of two sequences.
pub fn sequences_equal(a: &[char], b: &[char]) -> bool {
    a == b
}
