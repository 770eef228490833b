//! # TitleBar Component
//!
//! One-line status bar across the top of the screen.
//!
//! Stateless: every field is a prop copied from `App` or `TuiState` each
//! frame. Segments are dropped from the right when the terminal is narrow,
//! so the mode and status stay visible longest:
//!
//! ```text
//! Corpus [live] localhost:8000 | All semesters | ⠋ Searching course material... | ↓ New
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct TitleBar<'a> {
    /// "live" or "demo"
    pub mode: &'a str,
    /// Where answers come from (service host or demo user)
    pub service: &'a str,
    pub filters: String,
    pub status_message: &'a str,
    pub is_loading: bool,
    pub spinner_frame: usize,
    /// Content below the current scroll position
    pub has_unseen_content: bool,
}

impl<'a> TitleBar<'a> {
    fn spans(&self) -> Vec<Span<'a>> {
        let sep = || Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let mode_style = if self.mode == "demo" {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::Green)
        };

        let mut spans = vec![
            Span::styled("Corpus ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("[{}] ", self.mode), mode_style),
            Span::raw(self.service),
            sep(),
            Span::styled(self.filters.clone(), Style::default().fg(Color::Cyan)),
        ];

        if !self.status_message.is_empty() {
            spans.push(sep());
            if self.is_loading {
                let frame = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
                spans.push(Span::styled(
                    format!("{frame} "),
                    Style::default().fg(Color::Yellow),
                ));
            }
            spans.push(Span::raw(self.status_message));
        }

        if self.has_unseen_content {
            spans.push(sep());
            spans.push(Span::styled(
                "↓ New",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans
    }
}

impl<'a> Component for TitleBar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Line::from(self.spans()), area);
    }
}
