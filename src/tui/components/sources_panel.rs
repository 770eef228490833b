//! Side panel listing the material behind the latest answer.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::rag::Source;
use crate::tui::component::Component;
use crate::tui::markdown;

/// Width the panel asks for when the terminal is wide enough to show it.
pub const PANEL_WIDTH: u16 = 36;
/// Terminals narrower than this get the conversation only.
pub const MIN_TERMINAL_WIDTH: u16 = 80;
const EXCERPT_LINES: usize = 2;

pub struct SourcesPanel<'a> {
    pub sources: &'a [Source],
}

impl<'a> SourcesPanel<'a> {
    pub fn new(sources: &'a [Source]) -> Self {
        Self { sources }
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        if self.sources.is_empty() {
            return vec![Line::styled(
                "No sources for this answer.",
                Style::default().fg(Color::DarkGray),
            )];
        }

        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::new();
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            lines.push(Line::from(vec![
                Span::styled(format!("[{}] ", source.index), markdown::citation_style()),
                Span::styled(source.code.clone(), Style::default().fg(Color::Cyan)),
                Span::styled(format!(" {}%", source.match_percent()), dim),
            ]));
            lines.push(Line::styled(
                source.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            if let Some(page) = source.page {
                lines.push(Line::styled(format!("page {page}"), dim));
            }
            if let Some(excerpt) = source.text.as_deref() {
                lines.extend(
                    excerpt_lines(excerpt, usize::from(width))
                        .into_iter()
                        .map(|l| Line::styled(l, dim.add_modifier(Modifier::ITALIC))),
                );
            }
        }
        lines
    }
}

/// Wrap `excerpt` to `width` and keep the first lines, marking a cut.
fn excerpt_lines(excerpt: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    let mut wrapped: Vec<String> = textwrap::wrap(excerpt.trim(), width)
        .into_iter()
        .map(|l| l.into_owned())
        .collect();
    if wrapped.len() > EXCERPT_LINES {
        wrapped.truncate(EXCERPT_LINES);
        if let Some(last) = wrapped.last_mut() {
            let keep = width.saturating_sub(1);
            if last.chars().count() > keep {
                *last = last.chars().take(keep).collect();
            }
            last.push('…');
        }
    }
    wrapped
}

impl<'a> Component for SourcesPanel<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title(format!("Sources ({})", self.sources.len()))
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray))
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(self.lines(inner.width)).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn source(index: usize, text: Option<&str>) -> Source {
        Source {
            resource_id: format!("demo-{index}"),
            title: "Computer Networks Lab Manual".into(),
            code: "BCA404".into(),
            score: 0.92,
            index,
            page: Some(12),
            text: text.map(String::from),
        }
    }

    #[test]
    fn long_excerpt_is_cut_to_two_lines() {
        let lines = excerpt_lines(
            "Breadth-first search explores neighbours before moving a level deeper, using a queue.",
            20,
        );
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with('…'));
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn short_excerpt_is_untouched() {
        assert_eq!(excerpt_lines("  BFS uses a queue. ", 30), vec!["BFS uses a queue."]);
    }

    #[test]
    fn panel_lists_each_source() {
        let sources = vec![
            source(1, Some("BFS uses a queue.")),
            source(2, None),
        ];
        let mut terminal = Terminal::new(TestBackend::new(PANEL_WIDTH, 16)).unwrap();
        terminal
            .draw(|f| SourcesPanel::new(&sources).render(f, f.area()))
            .unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("Sources (2)"));
        assert!(screen.contains("[1] BCA404 92%"));
        assert!(screen.contains("[2] BCA404"));
        assert!(screen.contains("page 12"));
        assert!(screen.contains("BFS uses a queue."));
    }

    #[test]
    fn empty_panel_says_so() {
        let panel = SourcesPanel::new(&[]);
        let lines = panel.lines(30);
        assert_eq!(lines.len(), 1);
    }
}
