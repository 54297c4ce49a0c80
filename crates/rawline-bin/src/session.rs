//! Minimal single-line editing session driven by `SemanticKey`s.
//!
//! Holds the edit buffer, a session-local history and the incremental search
//! state. Purely in-memory: rendering and terminal I/O live in `render` and
//! `main`.

use core_events::{EditCommand, SemanticKey};
use core_input::escape::{CTRL_H, DEL};
use core_text::word::{word_end_after, word_start_before};
use core_text::{find_backward, find_forward};
use tracing::debug;

const CTRL_A: char = '\u{01}';
const CTRL_B: char = '\u{02}';
const CTRL_C: char = '\u{03}';
const CTRL_D: char = '\u{04}';
const CTRL_E: char = '\u{05}';
const CTRL_F: char = '\u{06}';
const CTRL_G: char = '\u{07}';
const CTRL_K: char = '\u{0b}';
const CTRL_R: char = '\u{12}';
const CTRL_S: char = '\u{13}';
const CTRL_T: char = '\u{14}';
const CTRL_U: char = '\u{15}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Submit(String),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

#[derive(Debug, Clone)]
struct SearchState {
    query: Vec<char>,
    direction: Direction,
    /// (history index, start offset) of the current match.
    hit: Option<(usize, usize)>,
    failed: bool,
    original: Vec<char>,
    original_cursor: usize,
}

/// What the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub prompt: Vec<char>,
    pub line: Vec<char>,
    pub cursor: usize,
}

#[derive(Debug, Default)]
pub struct LineSession {
    buf: Vec<char>,
    cursor: usize,
    history: Vec<Vec<char>>,
    /// Index into `history` while browsing with up/down.
    browse: Option<usize>,
    stash: Vec<char>,
    search: Option<SearchState>,
}

impl LineSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self) -> &[char] {
        &self.buf
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn view(&self, prompt: &str) -> View {
        match &self.search {
            Some(search) => {
                let label = match (search.failed, search.direction) {
                    (true, Direction::Backward) => "(failed reverse-i-search)`",
                    (true, Direction::Forward) => "(failed i-search)`",
                    (false, Direction::Backward) => "(reverse-i-search)`",
                    (false, Direction::Forward) => "(i-search)`",
                };
                let mut p: Vec<char> = label.chars().collect();
                p.extend_from_slice(&search.query);
                p.extend("': ".chars());
                View {
                    prompt: p,
                    line: self.buf.clone(),
                    cursor: self.cursor,
                }
            }
            None => View {
                prompt: prompt.chars().collect(),
                line: self.buf.clone(),
                cursor: self.cursor,
            },
        }
    }

    pub fn apply(&mut self, key: SemanticKey) -> Outcome {
        if self.search.is_some() {
            return self.apply_search(key);
        }
        match key {
            SemanticKey::Char(c) => {
                self.buf.insert(self.cursor, c);
                self.cursor += 1;
            }
            SemanticKey::Command(cmd) => self.apply_command(cmd),
            SemanticKey::Control(c) => return self.apply_control(c),
            SemanticKey::UnmappedMeta(_) | SemanticKey::Unrecognized => {}
        }
        Outcome::Continue
    }

    fn apply_command(&mut self, cmd: EditCommand) {
        match cmd {
            EditCommand::MoveBackward => self.cursor = self.cursor.saturating_sub(1),
            EditCommand::MoveForward => self.cursor = (self.cursor + 1).min(self.buf.len()),
            EditCommand::PreviousHistory => self.history_prev(),
            EditCommand::NextHistory => self.history_next(),
            EditCommand::WordBackward => self.cursor = word_start_before(&self.buf, self.cursor),
            EditCommand::WordForward => self.cursor = word_end_after(&self.buf, self.cursor),
            EditCommand::DeleteWord => {
                let end = word_end_after(&self.buf, self.cursor);
                self.buf.drain(self.cursor..end);
            }
            EditCommand::BackspaceWord => {
                let start = word_start_before(&self.buf, self.cursor);
                self.buf.drain(start..self.cursor);
                self.cursor = start;
            }
            EditCommand::TransposeChars => self.transpose(),
            EditCommand::EscapeLiteral => {}
        }
    }

    fn apply_control(&mut self, c: char) -> Outcome {
        match c {
            '\r' | '\n' => return self.submit(),
            CTRL_C => return Outcome::Exit,
            CTRL_D if self.buf.is_empty() => return Outcome::Exit,
            CTRL_D => {
                if self.cursor < self.buf.len() {
                    self.buf.remove(self.cursor);
                }
            }
            DEL | CTRL_H => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.buf.remove(self.cursor);
                }
            }
            CTRL_A => self.cursor = 0,
            CTRL_E => self.cursor = self.buf.len(),
            CTRL_B => self.apply_command(EditCommand::MoveBackward),
            CTRL_F => self.apply_command(EditCommand::MoveForward),
            CTRL_T => self.transpose(),
            CTRL_K => self.buf.truncate(self.cursor),
            CTRL_U => {
                self.buf.drain(..self.cursor);
                self.cursor = 0;
            }
            CTRL_R => self.start_search(Direction::Backward),
            CTRL_S => self.start_search(Direction::Forward),
            _ => {}
        }
        Outcome::Continue
    }

    fn submit(&mut self) -> Outcome {
        let line: String = self.buf.iter().collect();
        if !self.buf.is_empty() {
            self.history.push(std::mem::take(&mut self.buf));
        }
        self.buf.clear();
        self.cursor = 0;
        self.browse = None;
        self.stash.clear();
        Outcome::Submit(line)
    }

    fn transpose(&mut self) {
        if self.buf.len() < 2 || self.cursor == 0 {
            return;
        }
        // At end of line swap the last two chars; otherwise swap around the cursor.
        let at = self.cursor.min(self.buf.len() - 1);
        self.buf.swap(at - 1, at);
        self.cursor = (at + 1).min(self.buf.len());
    }

    fn set_line(&mut self, line: Vec<char>) {
        self.cursor = line.len();
        self.buf = line;
    }

    fn history_prev(&mut self) {
        let next = match self.browse {
            None if self.history.is_empty() => return,
            None => {
                self.stash = self.buf.clone();
                self.history.len() - 1
            }
            Some(0) => return,
            Some(i) => i - 1,
        };
        self.browse = Some(next);
        self.set_line(self.history[next].clone());
    }

    fn history_next(&mut self) {
        match self.browse {
            None => {}
            Some(i) if i + 1 < self.history.len() => {
                self.browse = Some(i + 1);
                self.set_line(self.history[i + 1].clone());
            }
            Some(_) => {
                self.browse = None;
                let stash = std::mem::take(&mut self.stash);
                self.set_line(stash);
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Incremental search
    // ---------------------------------------------------------------------------------------------

    fn start_search(&mut self, direction: Direction) {
        debug!(target: "runtime.search", ?direction, history = self.history.len(), "search_start");
        self.search = Some(SearchState {
            query: Vec::new(),
            direction,
            hit: None,
            failed: false,
            original: self.buf.clone(),
            original_cursor: self.cursor,
        });
    }

    fn apply_search(&mut self, key: SemanticKey) -> Outcome {
        match key {
            SemanticKey::Char(c) => {
                if let Some(s) = self.search.as_mut() {
                    s.query.push(c);
                }
                self.research_from_scratch();
            }
            SemanticKey::Control(DEL | CTRL_H) => {
                if let Some(s) = self.search.as_mut() {
                    s.query.pop();
                }
                self.research_from_scratch();
            }
            SemanticKey::Control(CTRL_R) => self.search_again(Direction::Backward),
            SemanticKey::Control(CTRL_S) => self.search_again(Direction::Forward),
            SemanticKey::Control(CTRL_G) | SemanticKey::Command(EditCommand::EscapeLiteral) => {
                if let Some(s) = self.search.take() {
                    self.buf = s.original;
                    self.cursor = s.original_cursor;
                }
            }
            SemanticKey::UnmappedMeta(_) | SemanticKey::Unrecognized => {}
            other => {
                // Any other key accepts the match and is then applied normally.
                self.search = None;
                self.browse = None;
                return self.apply(other);
            }
        }
        Outcome::Continue
    }

    fn research_from_scratch(&mut self) {
        let Some(search) = self.search.as_ref() else {
            return;
        };
        let hit = match search.direction {
            Direction::Backward => self.history.len().checked_sub(1).and_then(|newest| {
                self.scan_backward(&search.query, newest, None)
            }),
            Direction::Forward => self.scan_forward(&search.query, 0, 0),
        };
        self.show_hit(hit);
    }

    fn search_again(&mut self, direction: Direction) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        search.direction = direction;
        let Some((entry, offset)) = search.hit else {
            self.research_from_scratch();
            return;
        };
        let query = search.query.clone();
        let hit = match direction {
            // Matches must start strictly before the current one.
            Direction::Backward => self.scan_backward(&query, entry, Some(offset + query.len() - 1)),
            Direction::Forward => self.scan_forward(&query, entry, offset + 1),
        };
        match hit {
            Some(_) => self.show_hit(hit),
            None => {
                if let Some(s) = self.search.as_mut() {
                    s.failed = true;
                }
            }
        }
    }

    /// Newest-to-oldest from `entry`; `limit` truncates that first entry.
    fn scan_backward(&self, query: &[char], entry: usize, limit: Option<usize>) -> Option<(usize, usize)> {
        if query.is_empty() {
            return None;
        }
        (0..=entry).rev().find_map(|idx| {
            let line = &self.history[idx];
            let hay = match limit {
                Some(end) if idx == entry => &line[..end.min(line.len())],
                _ => &line[..],
            };
            find_backward(hay, query).map(|off| (idx, off))
        })
    }

    /// Oldest-to-newest from `entry`; `from` skips the start of that first entry.
    fn scan_forward(&self, query: &[char], entry: usize, from: usize) -> Option<(usize, usize)> {
        if query.is_empty() {
            return None;
        }
        (entry..self.history.len()).find_map(|idx| {
            let line = &self.history[idx];
            let skip = if idx == entry { from.min(line.len()) } else { 0 };
            find_forward(&line[skip..], query).map(|off| (idx, off + skip))
        })
    }

    fn show_hit(&mut self, hit: Option<(usize, usize)>) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        search.failed = hit.is_none() && !search.query.is_empty();
        search.hit = hit;
        match hit {
            Some((entry, offset)) => {
                self.buf = self.history[entry].clone();
                self.cursor = offset;
            }
            None if search.query.is_empty() => {
                self.buf = search.original.clone();
                self.cursor = search.original_cursor;
            }
            // Failed: keep showing the last successful match.
            None => {}
        }
    }
}
