//! Small overlay for typing paths of files to attach to the next message.
//! Opened with Ctrl+U, dismissed with Esc.

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachEvent {
    Upload(Vec<PathBuf>),
    Dismiss,
}

#[derive(Default)]
pub struct AttachPrompt {
    buffer: String,
    pub error: Option<String>,
}

impl AttachPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split the buffer into paths, whitespace separated.
    fn paths(&self) -> Vec<PathBuf> {
        self.buffer.split_whitespace().map(PathBuf::from).collect()
    }
}

impl EventHandler for AttachPrompt {
    type Event = AttachEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<AttachEvent> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.push(*c);
                None
            }
            TuiEvent::Paste(text) => {
                self.buffer.push_str(text);
                None
            }
            TuiEvent::Backspace => {
                self.buffer.pop();
                None
            }
            TuiEvent::Escape => Some(AttachEvent::Dismiss),
            TuiEvent::Submit => {
                let paths = self.paths();
                if paths.is_empty() {
                    Some(AttachEvent::Dismiss)
                } else {
                    Some(AttachEvent::Upload(paths))
                }
            }
            _ => None,
        }
    }
}

impl Component for AttachPrompt {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [box_area] = Layout::horizontal([Constraint::Percentage(70)])
            .flex(Flex::Center)
            .areas(area);
        let [box_area] = Layout::vertical([Constraint::Length(5)])
            .flex(Flex::Center)
            .areas(box_area);

        let mut lines = vec![Line::from(format!("> {}_", self.buffer))];
        match &self.error {
            Some(error) => lines.push(Line::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )),
            None => lines.push(Line::styled(
                "Separate multiple paths with spaces.",
                Style::default().fg(Color::DarkGray),
            )),
        }

        frame.render_widget(Clear, box_area);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::bordered()
                    .title(" Attach files ")
                    .title_bottom(Line::from(" Enter Upload  Esc Cancel ").centered())
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            box_area,
        );
    }
}
