//! # Landing Page Component
//!
//! Shown while the conversation is empty: a greeting and a few starter
//! questions. Tab copies the highlighted one into the input box.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::component::Component;

pub const SUGGESTIONS: [&str; 3] = [
    "Explain BFS and DFS with examples",
    "What is process scheduling in OS?",
    "Summarise DBMS normalisation",
];

pub struct LandingPage<'a> {
    /// Service or demo user answers come from
    pub service: &'a str,
    /// Which suggestion Tab inserts next
    pub suggestion_index: usize,
}

impl<'a> LandingPage<'a> {
    pub fn new(service: &'a str, suggestion_index: usize) -> Self {
        Self {
            service,
            suggestion_index,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let dim = Style::default().fg(Color::DarkGray);
        let selected = self.suggestion_index % SUGGESTIONS.len();

        let mut lines = vec![
            Line::styled(
                "Corpus",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::styled("Ask questions about your course material.", dim),
            Line::styled(format!("Answers from {}", self.service), dim),
            Line::default(),
        ];
        lines.extend(SUGGESTIONS.iter().enumerate().map(|(i, s)| {
            if i == selected {
                Line::from(vec![
                    Span::styled("› ", Style::default().fg(Color::Cyan)),
                    Span::styled(*s, Style::default().fg(Color::Cyan)),
                ])
            } else {
                Line::from(Span::styled(format!("  {s}"), dim))
            }
        }));
        lines.push(Line::default());
        lines.push(Line::styled(
            "Tab: use suggestion · Ctrl+D: demo mode · Ctrl+E: semester · Esc: quit",
            dim,
        ));
        lines.push(Line::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            dim,
        ));
        lines
    }
}

/// The suggestion after `index`, wrapping around.
pub fn next_suggestion(index: usize) -> (usize, &'static str) {
    let i = index % SUGGESTIONS.len();
    ((i + 1) % SUGGESTIONS.len(), SUGGESTIONS[i])
}

impl<'a> Component for LandingPage<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = self.lines();
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let [text_area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            text_area,
        );
    }
}
