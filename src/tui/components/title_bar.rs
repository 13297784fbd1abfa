//! One-line header: session title on the left, provider/model and the
//! signed-in user on the right.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::tui::component::Component;

pub struct TitleBar<'a> {
    pub session_title: Option<&'a str>,
    pub provider: Option<&'a str>,
    pub model: Option<&'a str>,
    pub username: &'a str,
    pub is_loading: bool,
    pub spinner_frame: usize,
}

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

impl TitleBar<'_> {
    fn left(&self) -> Vec<Span<'static>> {
        let mut spans = vec![
            Span::styled(
                " easychat ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ];
        match self.session_title {
            Some(title) => spans.push(Span::raw(title.to_string())),
            None => spans.push(Span::styled(
                "no session",
                Style::default().fg(Color::DarkGray),
            )),
        }
        if self.is_loading {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                SPINNER[self.spinner_frame % SPINNER.len()].to_string(),
                Style::default().fg(Color::Yellow),
            ));
        }
        spans
    }

    fn right(&self) -> String {
        let model = match (self.provider, self.model) {
            (Some(p), Some(m)) if !m.is_empty() => format!("{p}/{m}"),
            (Some(p), _) => p.to_string(),
            _ => String::new(),
        };
        if model.is_empty() {
            format!("{} ", self.username)
        } else {
            format!("{model}  ·  {} ", self.username)
        }
    }
}

impl Component for TitleBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let left = self.left();
        let right = self.right();

        let left_width: usize = left.iter().map(|s| s.content.width()).sum();
        let pad = (area.width as usize)
            .saturating_sub(left_width)
            .saturating_sub(right.width());

        let mut spans = left;
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(right, Style::default().fg(Color::DarkGray)));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
