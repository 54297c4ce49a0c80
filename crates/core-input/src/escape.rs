//! Escape-sequence classification.
//!
//! Two grammars are recognized, mirroring common terminal encodings:
//! * bracket form `ESC [ <final>` for cursor keys,
//! * meta form `ESC <char>` for word motions and edits.
//!
//! The bindings live in `BRACKET_BINDINGS` / `META_BINDINGS` as plain data so
//! they can be inspected and tested independently of `decode`. `decode` is a
//! pure function over a short lookahead slice; it keeps no state between calls.

use core_events::{EditCommand, SemanticKey};

pub const ESC: char = '\u{1b}';
pub const CSI_INTRO: char = '[';
pub const CTRL_H: char = '\u{08}';
pub const CTRL_T: char = '\u{14}';
pub const DEL: char = '\u{7f}';

/// Longest sequence `decode` will wait for before giving up on it.
pub const MAX_LOOKAHEAD: usize = 8;

/// `ESC [ <final>` bindings.
pub const BRACKET_BINDINGS: &[(char, EditCommand)] = &[
    ('A', EditCommand::PreviousHistory),
    ('B', EditCommand::NextHistory),
    ('C', EditCommand::MoveForward),
    ('D', EditCommand::MoveBackward),
];

/// `ESC <char>` bindings.
pub const META_BINDINGS: &[(char, EditCommand)] = &[
    ('b', EditCommand::WordBackward),
    ('f', EditCommand::WordForward),
    ('d', EditCommand::DeleteWord),
    (CTRL_T, EditCommand::TransposeChars),
    (DEL, EditCommand::BackspaceWord),
    (CTRL_H, EditCommand::BackspaceWord),
    (ESC, EditCommand::EscapeLiteral),
];

fn lookup(table: &[(char, EditCommand)], c: char) -> Option<EditCommand> {
    table.iter().find(|(k, _)| *k == c).map(|(_, cmd)| *cmd)
}

pub fn bracket_command(c: char) -> Option<EditCommand> {
    lookup(BRACKET_BINDINGS, c)
}

pub fn meta_command(c: char) -> Option<EditCommand> {
    lookup(META_BINDINGS, c)
}

/// Printable code points are passed through as insertable text.
///
/// A `char` can never be a surrogate, so the 0xD800..=0xDBFF exclusion holds
/// by construction. DEL counts as printable here; `decode` still routes it to
/// `Control` because raw mode delivers the backspace key as DEL.
pub fn is_printable(c: char) -> bool {
    c >= ' '
}

/// Outcome of one `decode` call.
///
/// `key == None` means the slice is a strict prefix of an escape sequence and
/// more input is required; `consumed` is then 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub key: Option<SemanticKey>,
    pub consumed: usize,
}

impl Decoded {
    const NEED_MORE: Decoded = Decoded {
        key: None,
        consumed: 0,
    };

    fn key(key: SemanticKey, consumed: usize) -> Self {
        Self {
            key: Some(key),
            consumed,
        }
    }
}

// CSI parameter / intermediate bytes (digits, ';', '?', ' ' ...). A sequence
// such as `ESC [ 3 ~` is swallowed whole instead of leaking "3~" as text.
fn is_csi_continuation(c: char) -> bool {
    ('\u{20}'..='\u{3f}').contains(&c)
}

fn is_csi_final(c: char) -> bool {
    ('\u{40}'..='\u{7e}').contains(&c)
}

fn decode_bracket(rest: &[char]) -> Decoded {
    // `rest` starts after `ESC [`.
    match rest.first() {
        None => Decoded::NEED_MORE,
        Some(&c) if is_csi_final(c) => {
            let key = bracket_command(c).map_or(SemanticKey::Unrecognized, SemanticKey::Command);
            Decoded::key(key, 3)
        }
        Some(&c) if is_csi_continuation(c) => {
            match rest.iter().position(|&c| !is_csi_continuation(c)) {
                // Parameterized sequences are never bound; drop through the final byte.
                Some(i) if is_csi_final(rest[i]) => Decoded::key(SemanticKey::Unrecognized, i + 3),
                // Malformed: drop what we have, leave the offending char for the next call.
                Some(i) => Decoded::key(SemanticKey::Unrecognized, i + 2),
                None if rest.len() + 2 >= MAX_LOOKAHEAD => {
                    Decoded::key(SemanticKey::Unrecognized, rest.len() + 2)
                }
                None => Decoded::NEED_MORE,
            }
        }
        // Not a CSI byte at all (control char, non-ASCII): drop `ESC [` only.
        Some(_) => Decoded::key(SemanticKey::Unrecognized, 2),
    }
}

/// Classify the key at the front of `input`.
pub fn decode(input: &[char]) -> Decoded {
    match input {
        [] | [ESC] => Decoded::NEED_MORE,
        [ESC, CSI_INTRO, rest @ ..] => decode_bracket(rest),
        [ESC, c, ..] => {
            let key = meta_command(*c).map_or(SemanticKey::UnmappedMeta(*c), SemanticKey::Command);
            Decoded::key(key, 2)
        }
        [DEL, ..] => Decoded::key(SemanticKey::Control(DEL), 1),
        [c, ..] if is_printable(*c) => Decoded::key(SemanticKey::Char(*c), 1),
        [c, ..] => Decoded::key(SemanticKey::Control(*c), 1),
    }
}

/// Resolve a pending prefix when no more input arrives within the lookahead
/// window (or at end of input). A lone ESC is the escape key itself; a dangling
/// `ESC [ ...` is dropped.
pub fn resolve_incomplete(input: &[char]) -> Option<SemanticKey> {
    match input {
        [] => None,
        [ESC] => Some(SemanticKey::Command(EditCommand::EscapeLiteral)),
        _ => Some(SemanticKey::Unrecognized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn bindings_have_unique_triggers() {
        for table in [BRACKET_BINDINGS, META_BINDINGS] {
            let mut keys: Vec<char> = table.iter().map(|(k, _)| *k).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), table.len());
        }
    }

    #[test]
    fn bracket_table_is_cursor_keys() {
        assert_eq!(bracket_command('A'), Some(EditCommand::PreviousHistory));
        assert_eq!(bracket_command('B'), Some(EditCommand::NextHistory));
        assert_eq!(bracket_command('C'), Some(EditCommand::MoveForward));
        assert_eq!(bracket_command('D'), Some(EditCommand::MoveBackward));
        assert_eq!(bracket_command('H'), None);
    }

    #[test]
    fn meta_table_lookups() {
        assert_eq!(meta_command('b'), Some(EditCommand::WordBackward));
        assert_eq!(meta_command('f'), Some(EditCommand::WordForward));
        assert_eq!(meta_command('d'), Some(EditCommand::DeleteWord));
        assert_eq!(meta_command(CTRL_T), Some(EditCommand::TransposeChars));
        assert_eq!(meta_command(DEL), Some(EditCommand::BackspaceWord));
        assert_eq!(meta_command(CTRL_H), Some(EditCommand::BackspaceWord));
        assert_eq!(meta_command(ESC), Some(EditCommand::EscapeLiteral));
        assert_eq!(meta_command('x'), None);
    }

    #[test]
    fn prefixes_need_more_input() {
        assert_eq!(decode(&[]), Decoded::NEED_MORE);
        assert_eq!(decode(&[ESC]), Decoded::NEED_MORE);
        assert_eq!(decode(&[ESC, '[']), Decoded::NEED_MORE);
        assert_eq!(decode(&chars("\u{1b}[1;5")), Decoded::NEED_MORE);
    }

    #[test]
    fn unknown_final_letter_is_unrecognized() {
        let d = decode(&chars("\u{1b}[Zx"));
        assert_eq!(d.key, Some(SemanticKey::Unrecognized));
        assert_eq!(d.consumed, 3);
    }

    #[test]
    fn parameterized_sequence_is_swallowed_whole() {
        let input = chars("\u{1b}[3~a");
        let d = decode(&input);
        assert_eq!(d.key, Some(SemanticKey::Unrecognized));
        assert_eq!(d.consumed, 4);
        assert_eq!(decode(&input[d.consumed..]).key, Some(SemanticKey::Char('a')));

        let modified = chars("\u{1b}[1;5C");
        assert_eq!(decode(&modified).consumed, modified.len());
    }

    #[test]
    fn runaway_parameters_are_bounded() {
        let input = chars("\u{1b}[111111");
        assert_eq!(input.len(), MAX_LOOKAHEAD);
        let d = decode(&input);
        assert_eq!(d.key, Some(SemanticKey::Unrecognized));
        assert_eq!(d.consumed, MAX_LOOKAHEAD);
    }

    #[test]
    fn control_after_bracket_is_not_swallowed() {
        let input = ['\u{1b}', '[', '\r'];
        let d = decode(&input);
        assert_eq!(d.key, Some(SemanticKey::Unrecognized));
        assert_eq!(d.consumed, 2);
        assert_eq!(decode(&input[2..]).key, Some(SemanticKey::Control('\r')));
    }

    #[test]
    fn unmapped_meta_is_distinct_from_plain_char() {
        assert_eq!(decode(&[ESC, 'x']).key, Some(SemanticKey::UnmappedMeta('x')));
        assert_eq!(decode(&['x']).key, Some(SemanticKey::Char('x')));
    }

    #[test]
    fn printable_predicate() {
        assert!(is_printable('a'));
        assert!(is_printable(' '));
        assert!(is_printable('漢'));
        assert!(is_printable('\u{1F600}'));
        assert!(!is_printable('\u{1f}'));
        assert!(!is_printable('\r'));
        assert!(is_printable(DEL));
        assert!(is_printable('\u{80}'));
    }

    #[test]
    fn controls_pass_through() {
        assert_eq!(decode(&['\r']).key, Some(SemanticKey::Control('\r')));
        assert_eq!(decode(&[DEL]).key, Some(SemanticKey::Control(DEL)));
        assert_eq!(decode(&[DEL, 'a']).consumed, 1);
    }

    #[test]
    fn resolve_lone_escape() {
        assert_eq!(
            resolve_incomplete(&[ESC]),
            Some(SemanticKey::Command(EditCommand::EscapeLiteral))
        );
        assert_eq!(resolve_incomplete(&[ESC, '[']), Some(SemanticKey::Unrecognized));
        assert_eq!(resolve_incomplete(&[]), None);
    }
}
