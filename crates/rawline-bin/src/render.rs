//! Prompt + line redraw over wrapped terminal rows.
//!
//! Each frame is first built as a list of `Command`s (pure, testable), then
//! queued through crossterm and flushed once.
//!
//! Design invariants:
//! * Geometry comes from the column count passed in for this frame; nothing
//!   about a previous width is assumed except the cursor row we left behind.
//! * The frame always starts by returning to the first row of the previous
//!   block and clearing everything below it.
//! * When the text ends exactly on the last column the terminal holds a
//!   pending wrap; an explicit CRLF moves the cursor onto the next row so the
//!   row arithmetic stays exact.

use crate::session::View;
use core_text::{WidthModel, line_count};
use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveUp(u16),
    MoveToColumn(u16),
    ClearBelow,
    Print(String),
}

/// Row/column placement of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Physical rows occupied by prompt + text (at least 1).
    pub lines: usize,
    /// Row the terminal cursor sits on after printing the text.
    pub end_row: usize,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub pending_wrap: bool,
}

pub fn layout(total_width: usize, cursor_width: usize, columns: usize) -> Layout {
    let cols = columns.max(1);
    Layout {
        // The prompt row exists even when everything is empty.
        lines: line_count(total_width, cols).max(1),
        end_row: total_width / cols,
        cursor_row: cursor_width / cols,
        cursor_col: cursor_width % cols,
        pending_wrap: total_width > 0 && total_width % cols == 0,
    }
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[derive(Debug)]
pub struct Renderer {
    model: WidthModel,
    /// Cursor row (relative to the block start) left by the previous frame.
    cursor_row: usize,
}

impl Renderer {
    pub fn new(model: WidthModel) -> Self {
        Self {
            model,
            cursor_row: 0,
        }
    }

    pub fn frame(&mut self, view: &View, columns: usize) -> Vec<Command> {
        let prompt_width = self.model.width(&view.prompt);
        let line_width = self.model.width(&view.line);
        let cursor = view.cursor.min(view.line.len());
        let cursor_width = prompt_width + self.model.width(&view.line[..cursor]);
        let total = prompt_width + line_width;
        let geo = layout(total, cursor_width, columns);
        debug!(
            target: "text.width",
            width = total,
            columns,
            lines = geo.lines,
            cursor_row = geo.cursor_row,
            "layout"
        );

        let mut cmds = Vec::with_capacity(8);
        if self.cursor_row > 0 {
            cmds.push(Command::MoveUp(to_u16(self.cursor_row)));
        }
        cmds.push(Command::MoveToColumn(0));
        cmds.push(Command::ClearBelow);
        let text: String = view.prompt.iter().chain(view.line.iter()).collect();
        if !text.is_empty() {
            cmds.push(Command::Print(text));
        }
        if geo.pending_wrap {
            cmds.push(Command::Print("\r\n".to_string()));
        }
        let up = geo.end_row.saturating_sub(geo.cursor_row);
        if up > 0 {
            cmds.push(Command::MoveUp(to_u16(up)));
        }
        cmds.push(Command::MoveToColumn(to_u16(geo.cursor_col)));
        self.cursor_row = geo.cursor_row;
        cmds
    }

    /// Final frame for an accepted line: cursor at end, then a fresh row.
    pub fn accept(&mut self, view: &View, columns: usize) -> Vec<Command> {
        let end = View {
            cursor: view.line.len(),
            ..view.clone()
        };
        let mut cmds = self.frame(&end, columns);
        cmds.push(Command::Print("\r\n".to_string()));
        self.cursor_row = 0;
        cmds
    }

    pub fn draw<W: Write>(&mut self, out: &mut W, view: &View, columns: usize) -> io::Result<()> {
        let cmds = self.frame(view, columns);
        flush(out, cmds)
    }
}

pub fn flush<W: Write>(out: &mut W, cmds: Vec<Command>) -> io::Result<()> {
    for c in cmds {
        match c {
            Command::MoveUp(n) => queue!(out, MoveUp(n))?,
            Command::MoveToColumn(x) => queue!(out, MoveToColumn(x))?,
            Command::ClearBelow => queue!(out, Clear(ClearType::FromCursorDown))?,
            Command::Print(s) => queue!(out, Print(s))?,
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(prompt: &str, line: &str, cursor: usize) -> View {
        View {
            prompt: prompt.chars().collect(),
            line: line.chars().collect(),
            cursor,
        }
    }

    #[test]
    fn layout_single_row() {
        let geo = layout(5, 3, 80);
        assert_eq!(geo.lines, 1);
        assert_eq!(geo.end_row, 0);
        assert_eq!((geo.cursor_row, geo.cursor_col), (0, 3));
        assert!(!geo.pending_wrap);
    }

    #[test]
    fn layout_wraps_past_width() {
        let geo = layout(81, 81, 80);
        assert_eq!(geo.lines, 2);
        assert_eq!(geo.end_row, 1);
        assert_eq!((geo.cursor_row, geo.cursor_col), (1, 1));
    }

    #[test]
    fn layout_exact_fill_is_pending_wrap() {
        let geo = layout(80, 80, 80);
        assert_eq!(geo.lines, 1);
        assert!(geo.pending_wrap);
        assert_eq!(geo.end_row, 1);
        assert_eq!((geo.cursor_row, geo.cursor_col), (1, 0));
    }

    #[test]
    fn layout_empty_still_one_row() {
        let geo = layout(0, 0, 80);
        assert_eq!(geo.lines, 1);
        assert!(!geo.pending_wrap);
    }

    #[test]
    fn layout_zero_columns_clamped() {
        let geo = layout(3, 1, 0);
        assert_eq!(geo.lines, 3);
        assert_eq!(geo.cursor_row, 1);
    }

    #[test]
    fn first_frame_does_not_move_up() {
        let mut r = Renderer::new(WidthModel::Utf8Heuristic);
        let cmds = r.frame(&view("> ", "abc", 1), 80);
        assert_eq!(
            cmds,
            vec![
                Command::MoveToColumn(0),
                Command::ClearBelow,
                Command::Print("> abc".into()),
                Command::MoveToColumn(3),
            ]
        );
    }

    #[test]
    fn wrapped_cursor_is_restored_on_next_frame() {
        let mut r = Renderer::new(WidthModel::Utf8Heuristic);
        // 2 + 10 = 12 columns at width 5 => rows 0..=2, cursor at end (row 2).
        r.frame(&view("> ", "0123456789", 10), 5);
        let cmds = r.frame(&view("> ", "x", 1), 5);
        assert_eq!(cmds[0], Command::MoveUp(2));
    }

    #[test]
    fn cursor_moves_back_up_within_block() {
        let mut r = Renderer::new(WidthModel::Utf8Heuristic);
        // Text ends on row 2; cursor on row 0.
        let cmds = r.frame(&view("> ", "0123456789", 1), 5);
        assert!(cmds.contains(&Command::MoveUp(2)));
        assert_eq!(cmds.last(), Some(&Command::MoveToColumn(3)));
    }

    #[test]
    fn wide_glyphs_count_double() {
        let mut r = Renderer::new(WidthModel::Utf8Heuristic);
        let cmds = r.frame(&view("", "😀😀", 1), 80);
        assert_eq!(cmds.last(), Some(&Command::MoveToColumn(2)));
        let mut t = Renderer::new(WidthModel::UnicodeTable);
        let cmds = t.frame(&view("", "漢字", 2), 80);
        assert_eq!(cmds.last(), Some(&Command::MoveToColumn(4)));
    }

    #[test]
    fn accept_leaves_fresh_row() {
        let mut r = Renderer::new(WidthModel::Utf8Heuristic);
        r.frame(&view("> ", "0123456789", 0), 5);
        let cmds = r.accept(&view("> ", "0123456789", 0), 5);
        assert_eq!(cmds.last(), Some(&Command::Print("\r\n".into())));
        let next = r.frame(&view("> ", "", 0), 5);
        assert_eq!(next[0], Command::MoveToColumn(0));
    }

    #[test]
    fn flush_emits_escape_sequences() {
        let mut out = Vec::new();
        flush(
            &mut out,
            vec![
                Command::MoveUp(1),
                Command::MoveToColumn(0),
                Command::ClearBelow,
                Command::Print("hi".into()),
            ],
        )
        .unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("\u{1b}[1A"));
        assert!(s.contains("\u{1b}[J"));
        assert!(s.ends_with("hi"));
    }
}
