//! # InputBox Component
//!
//! Single-line question editor. Long questions hard-wrap by display column
//! and scroll once they exceed a few rows.
//!
//! The buffer and cursor are internal state. `disabled` is a prop: while an
//! answer streams, typing still works but Enter does nothing.

use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally by the bordered block
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible rows before internal scrolling kicks in
const MAX_VISIBLE_ROWS: u16 = 3;

const PLACEHOLDER: &str = "Ask about your course material…";

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter on a non-blank question
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    pub buffer: String,
    /// True while an answer is streaming.
    pub disabled: bool,
    /// Cursor as a byte offset into `buffer` (always on a char boundary)
    cursor: usize,
    /// First visible row
    scroll: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            disabled: false,
            cursor: 0,
            scroll: 0,
        }
    }

    /// Replace the text and put the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.buffer.len();
        self.scroll = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Height for the current text at `area_width`, borders included.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let width = inner_width(area_width);
        let (rows, cursor_row, _) = layout(&self.buffer, self.cursor, width);
        let needed = rows.len().max(cursor_row + 1);
        let visible = u16::try_from(needed)
            .unwrap_or(u16::MAX)
            .min(MAX_VISIBLE_ROWS);
        visible + VERTICAL_OVERHEAD
    }

    /// Keep the cursor row inside the visible window.
    fn follow_cursor(&mut self, cursor_row: u16) {
        if cursor_row < self.scroll {
            self.scroll = cursor_row;
        } else if cursor_row >= self.scroll + MAX_VISIBLE_ROWS {
            self.scroll = cursor_row + 1 - MAX_VISIBLE_ROWS;
        }
    }

    fn block(&self) -> Block<'static> {
        let (title, style) = if self.disabled {
            (
                "Ask (waiting for the answer)",
                Style::default().fg(Color::DarkGray),
            )
        } else {
            ("Ask", Style::default().fg(Color::Green))
        };
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(style)
            .title(title)
            .title_style(style)
            .padding(Padding::horizontal(1))
    }
}

fn inner_width(area_width: u16) -> usize {
    usize::from(area_width.saturating_sub(HORIZONTAL_OVERHEAD))
}

/// Split `text` into rows of at most `width` display columns.
fn wrap_rows(text: &str, width: usize) -> Vec<Range<usize>> {
    let mut rows = Vec::new();
    if width == 0 {
        rows.push(0..text.len());
        return rows;
    }
    let mut start = 0;
    let mut cols = 0;
    for (i, c) in text.char_indices() {
        let w = c.width().unwrap_or(0);
        if cols + w > width && i > start {
            rows.push(start..i);
            start = i;
            cols = 0;
        }
        cols += w;
    }
    rows.push(start..text.len());
    rows
}

/// Rows plus the cursor's (row, column). A cursor sitting after a full
/// row lands at the start of the next one.
fn layout(text: &str, cursor: usize, width: usize) -> (Vec<Range<usize>>, usize, usize) {
    let rows = wrap_rows(text, width);
    let row = rows
        .iter()
        .rposition(|r| r.start <= cursor)
        .unwrap_or(0);
    let col = text[rows[row].start..cursor].width();
    if width > 0 && col >= width {
        (rows, row + 1, 0)
    } else {
        (rows, row, col)
    }
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = self.block();
        let inner = block.inner(area);

        if self.buffer.is_empty() {
            let placeholder = Paragraph::new(Line::styled(
                PLACEHOLDER,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))
            .block(block);
            frame.render_widget(placeholder, area);
            if !self.disabled {
                frame.set_cursor_position((inner.x, inner.y));
            }
            return;
        }

        let width = usize::from(inner.width);
        let (rows, cursor_row, cursor_col) = layout(&self.buffer, self.cursor, width);
        let cursor_row = u16::try_from(cursor_row).unwrap_or(u16::MAX);
        self.follow_cursor(cursor_row);

        let text_style = if self.disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let lines: Vec<Line> = rows
            .iter()
            .skip(usize::from(self.scroll))
            .take(usize::from(inner.height))
            .map(|r| Line::styled(&self.buffer[r.clone()], text_style))
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if !self.disabled {
            let col = u16::try_from(cursor_col).unwrap_or(u16::MAX);
            frame.set_cursor_position((
                inner.x.saturating_add(col),
                inner.y.saturating_add(cursor_row - self.scroll),
            ));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.cursor, text);
                self.cursor += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace if self.cursor > 0 => {
                let prev = prev_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete if self.cursor < self.buffer.len() => {
                let next = next_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft if self.cursor > 0 => {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorRight if self.cursor < self.buffer.len() => {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorHome if self.cursor > 0 => {
                self.cursor = 0;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorEnd if self.cursor < self.buffer.len() => {
                self.cursor = self.buffer.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Submit if !self.disabled && !self.buffer.trim().is_empty() => {
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                self.scroll = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}
