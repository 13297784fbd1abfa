//! Markdown → ratatui `Text` renderer for assistant messages.
//!
//! Walks `pulldown_cmark` events into styled `Line`/`Span` values. Covers
//! headings, emphasis, inline code, fenced code blocks (highlighted with
//! syntect), lists, blockquotes, and links. Anything else falls through as
//! plain text.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Render markdown into owned styled text with the given base color.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new(content) {
        renderer.event(event);
    }
    renderer.flush_line();
    renderer.text
}

struct Renderer {
    text: Text<'static>,
    base_fg: Color,
    /// Composable inline style stack (bold inside italic etc.).
    styles: Vec<Style>,
    /// Spans accumulated for the line being built.
    current: Vec<Span<'static>>,
    /// Indent prefix for list items; `"> "` depth for blockquotes.
    quote_depth: usize,
    /// List nesting: None = bullet, Some(n) = next ordered index.
    lists: Vec<Option<u64>>,
    /// Active highlighter while inside a fenced code block.
    code: Option<HighlightLines<'static>>,
    in_code_block: bool,
    link_url: Option<String>,
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base_fg,
            styles: vec![],
            current: vec![],
            quote_depth: 0,
            lists: vec![],
            code: None,
            in_code_block: false,
            link_url: None,
        }
    }

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = std::mem::take(&mut self.current);
        for _ in 0..self.quote_depth {
            spans.insert(0, Span::styled("│ ", Style::default().fg(Color::DarkGray)));
        }
        self.text.lines.push(Line::from(spans));
    }

    fn blank_line(&mut self) {
        if !self.text.lines.is_empty() {
            self.text.lines.push(Line::default());
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(t) => {
                if self.in_code_block {
                    self.code_text(&t);
                } else {
                    self.current.push(Span::styled(t.into_string(), self.style()));
                }
            }
            Event::Code(t) => {
                let style = Style::default().fg(Color::LightYellow).bg(Color::Black);
                self.current.push(Span::styled(t.into_string(), style));
            }
            Event::SoftBreak => {
                self.current.push(Span::styled(" ".to_string(), self.style()));
            }
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.text.lines.push(Line::from(Span::styled(
                    "────────",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.blank_line();
            }
            Tag::Heading { level, .. } => {
                self.blank_line();
                let color = match level {
                    HeadingLevel::H1 | HeadingLevel::H2 => Color::LightCyan,
                    _ => Color::Cyan,
                };
                self.push_style(Style::default().fg(color).add_modifier(Modifier::BOLD));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::BlockQuote(_) => {
                self.blank_line();
                self.quote_depth += 1;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.blank_line();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{indent}{n}. ");
                        *n += 1;
                        m
                    }
                    _ => format!("{indent}• "),
                };
                self.current
                    .push(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                self.blank_line();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    self.code = SYNTAX_SET.find_syntax_by_token(&lang).map(|syntax| {
                        HighlightLines::new(syntax, &THEME_SET.themes["base16-eighties.dark"])
                    });
                }
            }
            Tag::Link { dest_url, .. } => {
                self.push_style(
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                );
                self.link_url = Some(dest_url.into_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush_line(),
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.flush_line();
            }
            TagEnd::Emphasis | TagEnd::Strong => {
                self.styles.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.code = None;
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(url) = self.link_url.take() {
                    self.current.push(Span::styled(
                        format!(" ({url})"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            _ => {}
        }
    }

    /// Emit one line per newline inside a code block, highlighted if a
    /// syntax was recognized.
    fn code_text(&mut self, text: &str) {
        for line in LinesWithEndings::from(text) {
            let stripped = line.trim_end_matches('\n');
            match self.code.as_mut() {
                Some(hl) => {
                    let spans: Vec<Span<'static>> = hl
                        .highlight_line(line, &SYNTAX_SET)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|(style, chunk)| {
                            let fg = style.foreground;
                            Span::styled(
                                chunk.trim_end_matches('\n').to_string(),
                                Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                            )
                        })
                        .collect();
                    self.text.lines.push(Line::from(spans));
                }
                None => {
                    self.text.lines.push(Line::from(Span::styled(
                        stripped.to_string(),
                        Style::default().fg(Color::Gray),
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_plain_paragraph() {
        let text = render("hello world", Color::White);
        assert_eq!(plain(&text), vec!["hello world"]);
    }

    #[test]
    fn test_bullet_list_markers() {
        let text = render("- one\n- two", Color::White);
        let lines = plain(&text);
        assert_eq!(lines, vec!["• one", "• two"]);
    }

    #[test]
    fn test_ordered_list_counts() {
        let text = render("1. first\n2. second", Color::White);
        let lines = plain(&text);
        assert_eq!(lines, vec!["1. first", "2. second"]);
    }

    #[test]
    fn test_heading_is_bold() {
        let text = render("# Title", Color::White);
        let line = &text.lines[0];
        assert!(
            line.spans[0]
                .style
                .add_modifier
                .contains(Modifier::BOLD)
        );
    }

    #[test]
    fn test_code_block_lines_survive() {
        let text = render("```\nlet x = 1;\nlet y = 2;\n```", Color::White);
        let lines = plain(&text);
        assert!(lines.contains(&"let x = 1;".to_string()));
        assert!(lines.contains(&"let y = 2;".to_string()));
    }

    #[test]
    fn test_link_url_appended() {
        let text = render("[docs](https://example.com)", Color::White);
        let line: String = plain(&text).join("");
        assert!(line.contains("docs"));
        assert!(line.contains("https://example.com"));
    }
}
