//! Streaming key reader: raw bytes in, `SemanticKey`s out.
//!
//! Bytes are UTF-8 decoded incrementally (invalid input becomes U+FFFD) and
//! fed through `escape::decode`. Only the start of a key blocks; once an ESC
//! has been seen every continuation byte is awaited for at most
//! `escape_timeout`, after which the partial sequence is resolved with
//! `escape::resolve_incomplete`. The timeout value is the caller's policy.

use crate::escape::{self, MAX_LOOKAHEAD};
use core_events::{ESCAPES_DECODED, ESCAPES_DROPPED, KEYS_DECODED, META_UNMAPPED, SemanticKey};
use rustix::event::{PollFd, PollFlags, Timespec, poll};
use rustix::fd::AsFd;
use rustix::io::Errno;
use std::io::{self, Read};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::trace;

/// A byte source that can report readiness without consuming input.
pub trait KeySource: Read {
    /// Wait up to `timeout` for at least one readable byte.
    fn poll_readable(&mut self, timeout: Duration) -> io::Result<bool>;
}

/// In-memory input (tests, replay): readable until exhausted.
impl KeySource for &[u8] {
    fn poll_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.is_empty())
    }
}

/// Terminal-backed source using `poll(2)` for the lookahead window.
///
/// Reads go straight to the descriptor; a userspace buffer (such as the one
/// inside `io::Stdin`) would hide pending bytes from `poll`.
#[derive(Debug)]
pub struct TtySource<F> {
    inner: F,
}

impl<F: AsFd> TtySource<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: AsFd> Read for TtySource<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(rustix::io::read(&self.inner, buf)?)
    }
}

impl<F: AsFd> KeySource for TtySource<F> {
    fn poll_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let ts = Timespec {
            tv_sec: timeout.as_secs().try_into().unwrap_or(i64::MAX),
            tv_nsec: timeout.subsec_nanos().into(),
        };
        loop {
            let mut fds = [PollFd::new(&self.inner, PollFlags::IN)];
            match poll(&mut fds, Some(&ts)) {
                Ok(ready) => return Ok(ready > 0),
                Err(Errno::INTR) => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[inline]
pub(crate) fn log_key(key: &SemanticKey) {
    trace!(target: "input.key", kind = key.kind(), "decoded");
}

/// Count and log a classified key; `None` for keys that are swallowed.
fn emit(key: SemanticKey) -> Option<SemanticKey> {
    match key {
        SemanticKey::Unrecognized => {
            ESCAPES_DROPPED.fetch_add(1, Ordering::Relaxed);
            trace!(target: "input.escape", "unrecognized_dropped");
            return None;
        }
        SemanticKey::Command(_) => {
            ESCAPES_DECODED.fetch_add(1, Ordering::Relaxed);
        }
        SemanticKey::UnmappedMeta(_) => {
            META_UNMAPPED.fetch_add(1, Ordering::Relaxed);
        }
        SemanticKey::Char(_) | SemanticKey::Control(_) => {}
    }
    KEYS_DECODED.fetch_add(1, Ordering::Relaxed);
    log_key(&key);
    Some(key)
}

#[derive(Debug)]
pub struct KeyReader<S> {
    source: S,
    pending: Vec<char>,
    utf8: Vec<u8>,
    escape_timeout: Duration,
    eof: bool,
}

impl<S: KeySource> KeyReader<S> {
    pub fn new(source: S, escape_timeout: Duration) -> Self {
        Self {
            source,
            pending: Vec::with_capacity(MAX_LOOKAHEAD),
            utf8: Vec::with_capacity(4),
            escape_timeout,
            eof: false,
        }
    }

    /// Next semantic key, or `None` at end of input. Unrecognized escape
    /// sequences are dropped here and never reach the caller.
    ///
    /// # Errors
    ///
    /// Propagates read / poll failures from the source.
    pub fn next_key(&mut self) -> io::Result<Option<SemanticKey>> {
        loop {
            let decoded = escape::decode(&self.pending);
            if let Some(key) = decoded.key {
                self.pending.drain(..decoded.consumed);
                if let Some(key) = emit(key) {
                    return Ok(Some(key));
                }
                continue;
            }

            let wait = if self.pending.is_empty() {
                None
            } else {
                Some(self.escape_timeout)
            };
            match self.read_char(wait)? {
                Some(c) => self.pending.push(c),
                None if self.pending.is_empty() => return Ok(None),
                None => {
                    // Lookahead expired (or input ended) mid-sequence.
                    let key = escape::resolve_incomplete(&self.pending);
                    self.pending.clear();
                    if let Some(key) = key.and_then(emit) {
                        return Ok(Some(key));
                    }
                    if self.eof {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Read one code point. `wait == None` blocks; otherwise gives up (returning
    /// `None`) when nothing arrives within the window. Also `None` at EOF.
    fn read_char(&mut self, wait: Option<Duration>) -> io::Result<Option<char>> {
        if self.eof {
            return Ok(None);
        }
        loop {
            if let Some(timeout) = wait {
                if !self.source.poll_readable(timeout)? {
                    return Ok(None);
                }
            }
            let mut byte = [0u8; 1];
            let n = match self.source.read(&mut byte) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if n == 0 {
                self.eof = true;
                if self.utf8.is_empty() {
                    return Ok(None);
                }
                self.utf8.clear();
                return Ok(Some(char::REPLACEMENT_CHARACTER));
            }
            self.utf8.push(byte[0]);
            match std::str::from_utf8(&self.utf8) {
                Ok(s) => {
                    let c = s.chars().next();
                    self.utf8.clear();
                    return Ok(c);
                }
                // Incomplete multi-byte sequence: keep reading.
                Err(e) if e.error_len().is_none() => continue,
                Err(_) => {
                    self.utf8.clear();
                    return Ok(Some(char::REPLACEMENT_CHARACTER));
                }
            }
        }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: KeySource> Iterator for KeyReader<S> {
    type Item = io::Result<SemanticKey>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_key().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::EditCommand;
    use pretty_assertions::assert_eq;

    fn keys(input: &[u8]) -> Vec<SemanticKey> {
        KeyReader::new(input, Duration::ZERO)
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn mixed_stream_decodes_in_order() {
        let got = keys(b"a\x1b[Db\x1bf\r");
        assert_eq!(
            got,
            vec![
                SemanticKey::Char('a'),
                SemanticKey::Command(EditCommand::MoveBackward),
                SemanticKey::Char('b'),
                SemanticKey::Command(EditCommand::WordForward),
                SemanticKey::Control('\r'),
            ]
        );
    }

    #[test]
    fn multibyte_utf8_is_one_key() {
        let got = keys("漢😀".as_bytes());
        assert_eq!(got, vec![SemanticKey::Char('漢'), SemanticKey::Char('😀')]);
    }

    #[test]
    fn invalid_utf8_becomes_replacement() {
        let got = keys(b"\xffa");
        assert_eq!(
            got,
            vec![
                SemanticKey::Char(char::REPLACEMENT_CHARACTER),
                SemanticKey::Char('a')
            ]
        );
    }

    #[test]
    fn truncated_utf8_at_eof_becomes_replacement() {
        let got = keys(&"漢".as_bytes()[..2]);
        assert_eq!(got, vec![SemanticKey::Char(char::REPLACEMENT_CHARACTER)]);
    }

    #[test]
    fn unknown_bracket_sequence_is_dropped() {
        let got = keys(b"\x1b[Zx\x1b[3~y");
        assert_eq!(got, vec![SemanticKey::Char('x'), SemanticKey::Char('y')]);
    }

    #[test]
    fn lone_escape_at_eof_is_escape_literal() {
        let got = keys(b"\x1b");
        assert_eq!(got, vec![SemanticKey::Command(EditCommand::EscapeLiteral)]);
    }

    #[test]
    fn dangling_bracket_at_eof_is_dropped() {
        assert!(keys(b"\x1b[").is_empty());
        assert!(keys(b"\x1b[12").is_empty());
    }

    #[test]
    fn double_escape_is_literal() {
        let got = keys(b"\x1b\x1bq");
        assert_eq!(
            got,
            vec![
                SemanticKey::Command(EditCommand::EscapeLiteral),
                SemanticKey::Char('q')
            ]
        );
    }

    #[test]
    fn empty_input_is_immediate_eof() {
        let mut reader = KeyReader::new(&b""[..], Duration::ZERO);
        assert_eq!(reader.next_key().unwrap(), None);
        assert_eq!(reader.next_key().unwrap(), None);
    }

    #[test]
    fn dropped_sequences_are_counted() {
        let before = ESCAPES_DROPPED.load(Ordering::Relaxed);
        let _ = keys(b"\x1b[Q");
        assert!(ESCAPES_DROPPED.load(Ordering::Relaxed) > before);
    }

    #[test]
    fn tty_source_reads_descriptor_unbuffered() {
        use std::io::{Seek, SeekFrom, Write};
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"\x1b[Cz").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut reader = KeyReader::new(TtySource::new(file), Duration::from_millis(10));
        assert_eq!(
            reader.next_key().unwrap(),
            Some(SemanticKey::Command(EditCommand::MoveForward))
        );
        assert_eq!(reader.next_key().unwrap(), Some(SemanticKey::Char('z')));
        assert_eq!(reader.next_key().unwrap(), None);
    }
}
