//! Renders a single chat message with role-based styling.
//!
//! A transient component: created fresh each frame by `MessageList` with the
//! data it needs. User messages render as plain text, assistant messages as
//! markdown. The delivery marker (sending/failed) and any attachment URLs
//! show in the block title and body.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph, Wrap};

use crate::api::{Delivery, Message as ApiMessage, Role};
use crate::tui::component::Component;
use crate::tui::markdown;

/// Borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

pub struct MessageView<'a> {
    pub message: &'a ApiMessage,
    pub is_selected: bool,
}

impl<'a> MessageView<'a> {
    pub fn new(message: &'a ApiMessage, is_selected: bool) -> Self {
        Self {
            message,
            is_selected,
        }
    }

    fn role_color(&self) -> Color {
        match self.message.role {
            Role::User => Color::Cyan,
            Role::Assistant => Color::Green,
        }
    }

    fn title(&self) -> String {
        let who = match self.message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        let when = format_time(&self.message.timestamp);
        let tag = match self.message.delivery {
            Delivery::Sent => "",
            Delivery::Pending => "  [sending...]",
            Delivery::Failed => "  [failed]",
        };
        if when.is_empty() {
            format!(" {who}{tag} ")
        } else {
            format!(" {who} · {when}{tag} ")
        }
    }

    fn body(&self) -> Text<'static> {
        let mut text = match self.message.role {
            Role::Assistant => markdown::render(&self.message.content, Color::Gray),
            Role::User => Text::from(
                self.message
                    .content
                    .lines()
                    .map(|l| Line::from(l.to_string()))
                    .collect::<Vec<_>>(),
            ),
        };
        if let Some(urls) = &self.message.file_urls {
            for url in urls {
                text.lines.push(Line::from(Span::styled(
                    format!("📎 {url}"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        if text.lines.is_empty() {
            text.lines.push(Line::default());
        }
        text
    }

    fn paragraph(&self) -> Paragraph<'static> {
        let border_color = match self.message.delivery {
            Delivery::Failed => Color::Red,
            _ => self.role_color(),
        };
        let border_style = if self.is_selected {
            Style::default()
                .fg(border_color)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(border_color)
                .add_modifier(Modifier::DIM)
        };
        Paragraph::new(self.body())
            .block(
                Block::bordered()
                    .title(self.title())
                    .border_style(border_style)
                    .title_style(Style::default().fg(border_color)),
            )
            .wrap(Wrap { trim: false })
    }

    /// Predicted height at `width` columns, so the list can lay out and
    /// scroll without rendering first.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(2).max(1);
        let lines = Paragraph::new(self.body())
            .wrap(Wrap { trim: false })
            .line_count(inner) as u16;
        lines + VERTICAL_OVERHEAD
    }
}

impl Component for MessageView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.paragraph(), area);
    }
}

impl ratatui::widgets::Widget for MessageView<'_> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        ratatui::widgets::Widget::render(self.paragraph(), area, buf);
    }
}

/// "HH:MM" from an ISO-8601 timestamp, empty if unparseable.
fn format_time(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%H:%M").to_string())
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.format("%H:%M").to_string())
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user_message;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_render_shows_role_and_content() {
        let backend = TestBackend::new(40, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        let msg = user_message("hello there");
        let mut view = MessageView::new(&msg, false);

        terminal.draw(|f| view.render(f, f.area())).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("You"));
        assert!(text.contains("hello there"));
    }

    #[test]
    fn test_failed_message_shows_tag() {
        let backend = TestBackend::new(48, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut msg = user_message("oops");
        msg.delivery = Delivery::Failed;
        let mut view = MessageView::new(&msg, false);

        terminal.draw(|f| view.render(f, f.area())).unwrap();

        assert!(buffer_text(&terminal).contains("[failed]"));
    }

    #[test]
    fn test_format_time_handles_backend_timestamps() {
        // FastAPI's datetime.isoformat() has no timezone suffix
        assert_eq!(format_time("2024-03-05T14:30:00.123456"), "14:30");
        assert_eq!(format_time("2024-03-05T14:30:00+00:00"), "14:30");
        assert_eq!(format_time("garbage"), "");
    }

    #[test]
    fn test_height_grows_with_wrapping() {
        let short = user_message("hi");
        let long = user_message(&"word ".repeat(50));
        let h_short = MessageView::new(&short, false).calculate_height(30);
        let h_long = MessageView::new(&long, false).calculate_height(30);
        assert!(h_long > h_short);
    }
}
