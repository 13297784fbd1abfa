//! Sign-in form shown before the chat screen.
//!
//! Collects a username and password, masks the password, and validates that
//! both fields are filled before emitting a submit. While the credentials are
//! being checked against the server the form locks and shows a notice; a
//! rejected probe puts the error message above the fields and unlocks.

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Paragraph};

use crate::api::Credentials;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    Submit(Credentials),
}

pub struct LoginForm {
    username: String,
    password: String,
    focus: Field,
    pub error: Option<String>,
    pub validating: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            focus: Field::Username,
            error: None,
            validating: false,
        }
    }

    /// Prefill the username, e.g. from config or `--username`.
    pub fn with_username(username: &str) -> Self {
        let mut form = Self::new();
        form.username = username.to_string();
        if !username.is_empty() {
            form.focus = Field::Password;
        }
        form
    }

    /// Server rejected the credentials; unlock the form.
    pub fn reject(&mut self, message: String) {
        self.validating = false;
        self.password.clear();
        self.focus = Field::Password;
        self.error = Some(message);
    }

    fn active_field_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Username => Field::Password,
            Field::Password => Field::Username,
        };
    }

    fn submit(&mut self) -> Option<LoginEvent> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            self.error = Some("Username and password are required.".to_string());
            return None;
        }
        self.error = None;
        self.validating = true;
        Some(LoginEvent::Submit(Credentials::new(
            self.username.trim(),
            &self.password,
        )))
    }

    fn field_line(&self, label: &str, value: &str, field: Field, mask: bool) -> Line<'static> {
        let shown = if mask {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        let cursor = if self.focus == field && !self.validating {
            "_"
        } else {
            ""
        };
        let style = if self.focus == field {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Line::styled(format!("{label:>10}: {shown}{cursor}"), style)
    }
}

impl Component for LoginForm {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [box_area] = Layout::horizontal([Constraint::Length(44)])
            .flex(Flex::Center)
            .areas(area);
        let [box_area] = Layout::vertical([Constraint::Length(9)])
            .flex(Flex::Center)
            .areas(box_area);

        let mut lines = vec![Line::default()];
        match (&self.error, self.validating) {
            (Some(error), _) => lines.push(
                Line::from(error.clone())
                    .centered()
                    .style(Style::default().fg(Color::Red)),
            ),
            (None, true) => lines.push(
                Line::from("Signing in...")
                    .centered()
                    .style(Style::default().fg(Color::Yellow)),
            ),
            (None, false) => lines.push(Line::default()),
        }
        lines.push(Line::default());
        lines.push(self.field_line("Username", &self.username, Field::Username, false));
        lines.push(self.field_line("Password", &self.password, Field::Password, true));
        lines.push(Line::default());
        lines.push(
            Line::from("Tab switches field · Enter signs in")
                .centered()
                .style(Style::default().fg(Color::DarkGray)),
        );

        frame.render_widget(Clear, box_area);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::bordered()
                    .title(" Sign in ")
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            box_area,
        );
    }
}

impl EventHandler for LoginForm {
    type Event = LoginEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<LoginEvent> {
        if self.validating {
            return None;
        }
        match event {
            TuiEvent::InputChar(c) => {
                self.active_field_mut().push(*c);
                None
            }
            TuiEvent::Paste(text) => {
                self.active_field_mut().push_str(text);
                None
            }
            TuiEvent::Backspace => {
                self.active_field_mut().pop();
                None
            }
            TuiEvent::Tab | TuiEvent::CursorUp | TuiEvent::CursorDown => {
                self.toggle_focus();
                None
            }
            TuiEvent::Submit => self.submit(),
            TuiEvent::Escape => {
                self.error = None;
                None
            }
            _ => None,
        }
    }
}
