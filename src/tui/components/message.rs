use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::citation::cited_indices;
use crate::core::conversation::ConversationMessage;
use crate::rag::{Role, Source};
use crate::tui::component::Component;
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

const STREAMING_CURSOR: &str = "▌";
const WAITING_TEXT: &str = "Searching course material…";

/// One conversation turn in a rounded box.
///
/// Transient: built each frame from the message it shows. Assistant replies
/// are rendered as markdown with citations highlighted; a failed reply is
/// shown in red. With `show_citations`, a finished reply lists its sources
/// under the answer.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a ConversationMessage,
    pub show_citations: bool,
}

impl<'a> Message<'a> {
    pub fn new(message: &'a ConversationMessage, show_citations: bool) -> Self {
        Self {
            message,
            show_citations,
        }
    }

    fn role_label(&self) -> &'static str {
        match self.message.role {
            Role::User => "you",
            Role::Assistant if self.message.error => "corpus · error",
            Role::Assistant => "corpus",
        }
    }

    fn style(&self) -> Style {
        match self.message.role {
            Role::User => Style::default().fg(Color::Cyan),
            Role::Assistant if self.message.error => Style::default().fg(Color::Red),
            Role::Assistant => Style::default().fg(Color::Green),
        }
    }

    fn body(&self) -> Text<'static> {
        let m = self.message;
        let style = self.style();

        let mut text = match m.role {
            Role::User => Text::styled(m.content.trim().to_string(), style),
            Role::Assistant if m.error => Text::styled(m.content.clone(), style),
            Role::Assistant if m.streaming && m.content.is_empty() => Text::styled(
                WAITING_TEXT,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
            Role::Assistant => {
                let fg = style.fg.unwrap_or(Color::Reset);
                markdown::render(&m.content, fg, &m.sources)
            }
        };

        if m.streaming && !m.content.is_empty() {
            let cursor = Span::styled(STREAMING_CURSOR, style);
            match text.lines.last_mut() {
                Some(line) => line.push_span(cursor),
                None => text.lines.push(Line::from(cursor)),
            }
        }

        if self.show_citations && !m.streaming && !m.sources.is_empty() {
            text.lines.push(Line::default());
            text.lines.push(Line::styled(
                "Citations",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ));
            let cited = cited_indices(&m.content, &m.sources);
            text.lines.extend(
                m.sources
                    .iter()
                    .map(|s| citation_line(s, cited.contains(&s.index))),
            );
        }
        text
    }

    fn paragraph(&self) -> Paragraph<'static> {
        Paragraph::new(self.body()).wrap(Wrap { trim: false })
    }

    /// Rows this message needs at `width`, borders included.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = self.paragraph().line_count(content_width).max(1);
        u16::try_from(lines)
            .unwrap_or(u16::MAX)
            .saturating_add(VERTICAL_OVERHEAD)
    }
}

/// Sources the answer never cites are listed dimmed.
fn citation_line(source: &Source, cited: bool) -> Line<'static> {
    let marker_style = if cited {
        markdown::citation_style()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![
        Span::styled(format!("[{}] ", source.index), marker_style),
        Span::styled(
            format!("{} ", source.code),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(source.title.clone()),
    ];
    if let Some(page) = source.page {
        spans.push(Span::styled(
            format!(" · p.{page}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        format!(" ({}% match)", source.match_percent()),
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = self.style();
        let border_style = if self.message.streaming {
            style
        } else {
            style.add_modifier(Modifier::DIM)
        };

        let block = Block::bordered()
            .title(self.role_label())
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);
        self.paragraph().render(inner_area, buf);
    }
}

impl<'a> Component for Message<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
