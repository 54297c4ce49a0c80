//! Semantic key types shared between the decoder, the input reader and the
//! line-editing loop.
//!
//! A `SemanticKey` is produced transiently for a single decode and consumed
//! immediately by the command interpreter; nothing here carries state across
//! calls except the relaxed telemetry counters below.

use std::fmt;
use std::sync::atomic::AtomicU64;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Simple atomic counters (no locking, fetch_add relaxed). Inspected by unit tests and logged at
// session end by the binary.
// -------------------------------------------------------------------------------------------------
pub static KEYS_DECODED: AtomicU64 = AtomicU64::new(0); // keys handed to the interpreter
pub static ESCAPES_DECODED: AtomicU64 = AtomicU64::new(0); // ESC-prefixed sequences mapped to a command
pub static ESCAPES_DROPPED: AtomicU64 = AtomicU64::new(0); // unrecognized bracket sequences swallowed
pub static META_UNMAPPED: AtomicU64 = AtomicU64::new(0); // ESC + unmapped char surfaced to the interpreter

/// Closed set of editing commands reachable through escape sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditCommand {
    MoveBackward,
    MoveForward,
    PreviousHistory,
    NextHistory,
    WordBackward,
    WordForward,
    DeleteWord,
    TransposeChars,
    BackspaceWord,
    /// ESC ESC: a literal escape key with no navigation effect.
    EscapeLiteral,
}

impl EditCommand {
    /// Stable lowercase identifier used in log fields.
    pub const fn name(self) -> &'static str {
        match self {
            EditCommand::MoveBackward => "move_backward",
            EditCommand::MoveForward => "move_forward",
            EditCommand::PreviousHistory => "previous_history",
            EditCommand::NextHistory => "next_history",
            EditCommand::WordBackward => "word_backward",
            EditCommand::WordForward => "word_forward",
            EditCommand::DeleteWord => "delete_word",
            EditCommand::TransposeChars => "transpose_chars",
            EditCommand::BackspaceWord => "backspace_word",
            EditCommand::EscapeLiteral => "escape_literal",
        }
    }
}

/// Result of classifying one unit of terminal input.
///
/// Invariants:
/// * `Char` only ever carries a printable code point (see `core_input::is_printable`).
/// * `Control` never carries ESC; ESC is always folded into a command,
///   `UnmappedMeta` or `Unrecognized`.
/// * Consumers log only the kind (`SemanticKey::kind`), never the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticKey {
    /// Insertable text, passed through unaltered.
    Char(char),
    /// Escape-derived editing command.
    Command(EditCommand),
    /// Non-printable, non-escape code point (Enter, Ctrl-A, DEL, ...).
    Control(char),
    /// ESC followed by a character with no meta binding. Distinct from "no
    /// escape at all" so the interpreter can ignore it without inserting text.
    UnmappedMeta(char),
    /// Bracket sequence with an unknown final letter. The reader drops these.
    Unrecognized,
}

impl SemanticKey {
    pub const fn kind(&self) -> &'static str {
        match self {
            SemanticKey::Char(_) => "char",
            SemanticKey::Command(cmd) => cmd.name(),
            SemanticKey::Control(_) => "control",
            SemanticKey::UnmappedMeta(_) => "unmapped_meta",
            SemanticKey::Unrecognized => "unrecognized",
        }
    }

    pub fn is_command(&self, cmd: EditCommand) -> bool {
        matches!(self, SemanticKey::Command(c) if *c == cmd)
    }
}

impl From<EditCommand> for SemanticKey {
    fn from(cmd: EditCommand) -> Self {
        SemanticKey::Command(cmd)
    }
}

impl fmt::Display for SemanticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticKey::Char(c) => write!(f, "Char({c:?})"),
            SemanticKey::Command(cmd) => write!(f, "{}", cmd.name()),
            SemanticKey::Control(c) => write!(f, "Control(0x{:02x})", u32::from(*c)),
            SemanticKey::UnmappedMeta(c) => write!(f, "Meta({c:?})"),
            SemanticKey::Unrecognized => f.write_str("unrecognized"),
        }
    }
}
