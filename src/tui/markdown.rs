//! Markdown → ratatui `Text` renderer for answers.
//!
//! Converts `pulldown_cmark` events into styled lines: headings, emphasis,
//! inline code, fenced code blocks (syntect highlighting), lists, block quotes
//! and links. Ordinary text is passed through the citation binder so `[n]`
//! markers that match a source are highlighted.

use std::sync::LazyLock;

use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::core::citation::{self, Fragment};
use crate::rag::Source;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";

pub fn citation_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn frame_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Render `content` with `base_fg` as the body colour, binding citations
/// against `sources`.
pub fn render(content: &str, base_fg: Color, sources: &[Source]) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    // `[1]` arrives as separate "[", "1", "]" text events unless merged.
    let parser = TextMergeStream::new(Parser::new_ext(content, opts));
    let mut renderer = Renderer::new(base_fg, sources);
    for event in parser {
        renderer.event(event);
    }
    renderer.out
}

struct Renderer<'s> {
    out: Text<'static>,
    base_fg: Color,
    sources: &'s [Source],
    /// Composed inline styles; the top is the current one.
    style_stack: Vec<Style>,
    /// Spans repeated at the start of every line (quote and code gutters).
    gutters: Vec<Span<'static>>,
    /// One entry per open list: `None` bullets, `Some(n)` numbers from n.
    lists: Vec<Option<u64>>,
    code: Option<CodeBlock>,
    pending_url: Option<String>,
    gap_before_block: bool,
    /// A list marker was just written; the item's first paragraph joins it.
    item_open: bool,
}

enum CodeBlock {
    Highlighted(HighlightLines<'static>),
    Plain,
}

impl<'s> Renderer<'s> {
    fn new(base_fg: Color, sources: &'s [Source]) -> Self {
        Self {
            out: Text::default(),
            base_fg,
            sources,
            style_stack: Vec::new(),
            gutters: Vec::new(),
            lists: Vec::new(),
            code: None,
            pending_url: None,
            gap_before_block: false,
            item_open: false,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.style_stack.push(self.current_style().patch(overlay));
    }

    fn new_line(&mut self, mut line: Line<'static>) {
        for gutter in self.gutters.iter().rev() {
            line.spans.insert(0, gutter.clone());
        }
        self.out.lines.push(line);
    }

    fn append(&mut self, span: Span<'static>) {
        match self.out.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.new_line(Line::from(span)),
        }
    }

    fn start_block(&mut self) {
        if self.gap_before_block {
            self.new_line(Line::default());
            self.gap_before_block = false;
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => self.append(Span::styled(
                code.to_string(),
                Style::default().fg(Color::White).bg(Color::DarkGray),
            )),
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(Line::default()),
            Event::Rule => {
                self.start_block();
                self.new_line(Line::from(Span::styled("─".repeat(32), frame_style())));
                self.gap_before_block = true;
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph if self.item_open => {
                self.item_open = false;
                self.gap_before_block = false;
            }
            Tag::Paragraph => {
                self.start_block();
                self.new_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                let style = heading_style(self.base_fg, level);
                self.new_line(Line::default());
                self.push_style(style);
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.gutters.push(Span::styled("│ ", frame_style()));
                self.push_style(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM));
            }
            Tag::CodeBlock(kind) => {
                if !self.out.lines.is_empty() {
                    self.new_line(Line::default());
                }
                let lang = match &kind {
                    CodeBlockKind::Fenced(lang) => lang.as_ref(),
                    CodeBlockKind::Indented => "",
                };
                let header = if lang.is_empty() {
                    "╭──".to_string()
                } else {
                    format!("╭── {lang}")
                };
                self.new_line(Line::from(Span::styled(header, frame_style())));
                self.gutters.push(Span::styled("│ ", frame_style()));

                let syntax = (!lang.is_empty())
                    .then(|| SYNTAX_SET.find_syntax_by_token(lang))
                    .flatten();
                self.code = match (syntax, THEME_SET.themes.get(CODE_THEME)) {
                    (Some(syntax), Some(theme)) => {
                        Some(CodeBlock::Highlighted(HighlightLines::new(syntax, theme)))
                    }
                    _ => Some(CodeBlock::Plain),
                };
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_block();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.new_line(Line::default());
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.append(Span::styled(marker, frame_style()));
                self.item_open = true;
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.pending_url = Some(dest_url.to_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.gap_before_block = true,
            TagEnd::Heading(_) => {
                self.style_stack.pop();
                self.gap_before_block = true;
            }
            TagEnd::BlockQuote(_) => {
                self.gutters.pop();
                self.style_stack.pop();
                self.gap_before_block = true;
            }
            TagEnd::CodeBlock => {
                self.code = None;
                self.gutters.pop();
                self.new_line(Line::from(Span::styled("╰──", frame_style())));
                self.gap_before_block = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.gap_before_block = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link => {
                self.style_stack.pop();
                if let Some(url) = self.pending_url.take() {
                    self.append(Span::styled(format!(" <{url}>"), frame_style()));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: CowStr<'_>) {
        self.item_open = false;
        // ratatui draws tabs as zero width
        let text = text.replace('\t', "    ");

        match self.code.take() {
            Some(CodeBlock::Highlighted(mut highlighter)) => {
                for line in LinesWithEndings::from(&text) {
                    let Ok(ranges) = highlighter.highlight_line(line, &SYNTAX_SET) else {
                        self.new_line(Line::raw(line.trim_end_matches('\n').to_string()));
                        continue;
                    };
                    let spans: Vec<Span<'static>> = ranges
                        .into_iter()
                        .map(|(style, piece)| {
                            let fg = style.foreground;
                            Span::styled(
                                piece.trim_end_matches('\n').to_string(),
                                Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                            )
                        })
                        .filter(|span| !span.content.is_empty())
                        .collect();
                    self.new_line(Line::from(spans));
                }
                self.code = Some(CodeBlock::Highlighted(highlighter));
            }
            Some(CodeBlock::Plain) => {
                for line in text.lines() {
                    self.new_line(Line::styled(line.to_string(), Style::default().fg(Color::White)));
                }
                self.code = Some(CodeBlock::Plain);
            }
            None => {
                let style = self.current_style();
                let sources = self.sources;
                for fragment in citation::segments(&text, sources) {
                    let span = match fragment {
                        Fragment::Text(t) => Span::styled(t.to_string(), style),
                        Fragment::Citation { marker, .. } => {
                            Span::styled(marker.to_string(), style.patch(citation_style()))
                        }
                    };
                    self.append(span);
                }
            }
        }
    }
}

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    let style = Style::default().fg(base_fg).add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style,
        _ => style.add_modifier(Modifier::ITALIC),
    }
}
