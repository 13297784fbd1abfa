//! Overlay for browsing, creating, renaming, and deleting sessions.
//! Opened with Ctrl+O, dismissed with Esc.
//!
//! Unlike most overlays this one does not own the session list: sessions live
//! in `App` and are borrowed each frame, so the panel never goes stale when a
//! refresh lands while it is open. Only cursor position, the delete
//! confirmation, and the title input buffer persist here.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::api::Session;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// What the title input buffer is for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TitleTarget {
    NewSession,
    Rename(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    Select(String),
    Create(String),
    Rename { id: String, title: String },
    Delete(String),
    Dismiss,
}

#[derive(Default)]
pub struct SessionPanelState {
    pub selected: usize,
    confirm_delete: bool,
    list_state: ListState,
    title_input: Option<(TitleTarget, String)>,
}

impl SessionPanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the cursor at the given session id, if present.
    pub fn focus(&mut self, sessions: &[Session], current_id: Option<&str>) {
        self.selected = current_id
            .and_then(|id| sessions.iter().position(|s| s.id == id))
            .unwrap_or(0);
        self.confirm_delete = false;
        self.title_input = None;
        self.sync_list_state(sessions.len());
    }

    fn sync_list_state(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(len - 1);
            self.list_state.select(Some(self.selected));
        }
    }
}

pub struct SessionPanel<'a> {
    state: &'a mut SessionPanelState,
    sessions: &'a [Session],
}

impl<'a> SessionPanel<'a> {
    pub fn new(state: &'a mut SessionPanelState, sessions: &'a [Session]) -> Self {
        state.sync_list_state(sessions.len());
        Self { state, sessions }
    }

    fn handle_title_input(&mut self, event: &TuiEvent) -> Option<PanelEvent> {
        let (target, buffer) = self.state.title_input.as_mut()?;
        match event {
            TuiEvent::InputChar(c) => {
                buffer.push(*c);
                None
            }
            TuiEvent::Paste(text) => {
                buffer.push_str(text);
                None
            }
            TuiEvent::Backspace => {
                buffer.pop();
                None
            }
            TuiEvent::Escape => {
                self.state.title_input = None;
                None
            }
            TuiEvent::Submit => {
                let title = buffer.trim().to_string();
                let event = match target {
                    TitleTarget::NewSession => Some(PanelEvent::Create(title)),
                    TitleTarget::Rename(id) => {
                        if title.is_empty() {
                            // Keep the old title rather than blanking it.
                            None
                        } else {
                            Some(PanelEvent::Rename {
                                id: id.clone(),
                                title,
                            })
                        }
                    }
                };
                self.state.title_input = None;
                event
            }
            _ => None,
        }
    }
}

impl EventHandler for SessionPanel<'_> {
    type Event = PanelEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<PanelEvent> {
        if self.state.title_input.is_some() {
            return self.handle_title_input(event);
        }

        // Delete needs two 'd' presses; anything else cancels the pending one
        let is_delete_key = matches!(event, TuiEvent::InputChar('d'));
        if !is_delete_key {
            self.state.confirm_delete = false;
        }

        match event {
            TuiEvent::Escape => Some(PanelEvent::Dismiss),
            TuiEvent::CursorUp => {
                if !self.sessions.is_empty() {
                    self.state.selected = self.state.selected.saturating_sub(1);
                    self.state.list_state.select(Some(self.state.selected));
                }
                None
            }
            TuiEvent::CursorDown => {
                if !self.sessions.is_empty() {
                    self.state.selected =
                        (self.state.selected + 1).min(self.sessions.len() - 1);
                    self.state.list_state.select(Some(self.state.selected));
                }
                None
            }
            TuiEvent::Submit => self
                .sessions
                .get(self.state.selected)
                .map(|session| PanelEvent::Select(session.id.clone())),
            TuiEvent::InputChar('n') => {
                self.state.title_input = Some((TitleTarget::NewSession, String::new()));
                None
            }
            TuiEvent::InputChar('r') => {
                if let Some(session) = self.sessions.get(self.state.selected) {
                    self.state.title_input =
                        Some((TitleTarget::Rename(session.id.clone()), session.title.clone()));
                }
                None
            }
            TuiEvent::InputChar('d') => {
                if self.sessions.is_empty() {
                    return None;
                }
                if self.state.confirm_delete {
                    self.state.confirm_delete = false;
                    Some(PanelEvent::Delete(
                        self.sessions[self.state.selected].id.clone(),
                    ))
                } else {
                    self.state.confirm_delete = true;
                    None
                }
            }
            _ => None,
        }
    }
}

impl Component for SessionPanel<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 70, area);
        frame.render_widget(Clear, overlay);

        let help_text = if let Some((target, _)) = &self.state.title_input {
            match target {
                TitleTarget::NewSession => " Title for new session | Enter Create  Esc Cancel ",
                TitleTarget::Rename(_) => " New title | Enter Rename  Esc Cancel ",
            }
        } else if self.state.confirm_delete {
            " Press d again to confirm delete | Esc Cancel "
        } else {
            " n New  r Rename  d Delete  Enter Open  Esc Back "
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Sessions ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(help_text).centered())
            .padding(Padding::horizontal(1));

        if let Some((_, buffer)) = &self.state.title_input {
            block = block.title_bottom(
                Line::from(format!(" > {buffer}_ "))
                    .left_aligned()
                    .style(Style::default().fg(Color::Yellow)),
            );
        }

        if self.sessions.is_empty() {
            let empty = Paragraph::new("No sessions. Press n to create one.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let items: Vec<ListItem> = self
            .sessions
            .iter()
            .enumerate()
            .map(|(i, session)| {
                let date = format_timestamp(&session.updated_at);
                let count = format!("{} msgs", session.messages.len());

                // Layout: "  Jan 15  <title>   12 msgs  "
                let inner_width = overlay.width.saturating_sub(4) as usize;
                let fixed_width = date.width() + 2 + count.width() + 2;
                let title_width = inner_width.saturating_sub(fixed_width);
                let title = truncate_str(&session.title, title_width);
                let padded_title = format!("{title:<title_width$}");

                let style = if i == self.state.selected {
                    if self.state.confirm_delete {
                        Style::default()
                            .fg(Color::Red)
                            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                    } else {
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                    }
                } else {
                    Style::default().fg(Color::Gray)
                };

                let line = Line::from(vec![
                    Span::styled(date, style),
                    Span::styled("  ", style),
                    Span::styled(padded_title, style),
                    Span::styled("  ", style),
                    Span::styled(count, style),
                ]);

                ListItem::new(line)
            })
            .collect();

        frame.render_stateful_widget(
            List::new(items).block(block),
            overlay,
            &mut self.state.list_state,
        );
    }
}

/// Format an ISO-8601 timestamp as a "Jan 15" style date.
fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%b %d").to_string())
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.format("%b %d").to_string())
        })
        .unwrap_or_else(|_| "??".to_string())
}

/// Truncate a string to fit within `max_width` chars, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        ".".repeat(max_width)
    } else {
        let cut: String = s.chars().take(max_width - 3).collect();
        format!("{cut}...")
    }
}

/// Compute a centered rect using percentage of the outer rect.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::session;

    fn sessions(n: usize) -> Vec<Session> {
        (0..n)
            .map(|i| session(&format!("id-{i}"), &format!("Session {i}")))
            .collect()
    }

    #[test]
    fn test_enter_selects_session_under_cursor() {
        let list = sessions(3);
        let mut state = SessionPanelState::new();
        let mut panel = SessionPanel::new(&mut state, &list);
        panel.handle_event(&TuiEvent::CursorDown);

        let event = panel.handle_event(&TuiEvent::Submit);
        assert_eq!(event, Some(PanelEvent::Select("id-1".to_string())));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let list = sessions(2);
        let mut state = SessionPanelState::new();
        let mut panel = SessionPanel::new(&mut state, &list);

        assert_eq!(panel.handle_event(&TuiEvent::InputChar('d')), None);
        assert_eq!(
            panel.handle_event(&TuiEvent::InputChar('d')),
            Some(PanelEvent::Delete("id-0".to_string()))
        );
    }

    #[test]
    fn test_moving_cursor_cancels_pending_delete() {
        let list = sessions(2);
        let mut state = SessionPanelState::new();
        let mut panel = SessionPanel::new(&mut state, &list);

        panel.handle_event(&TuiEvent::InputChar('d'));
        panel.handle_event(&TuiEvent::CursorDown);
        assert_eq!(panel.handle_event(&TuiEvent::InputChar('d')), None);
    }

    #[test]
    fn test_new_session_title_input() {
        let list = sessions(1);
        let mut state = SessionPanelState::new();
        let mut panel = SessionPanel::new(&mut state, &list);

        panel.handle_event(&TuiEvent::InputChar('n'));
        for c in "Ideas".chars() {
            panel.handle_event(&TuiEvent::InputChar(c));
        }
        let event = panel.handle_event(&TuiEvent::Submit);
        assert_eq!(event, Some(PanelEvent::Create("Ideas".to_string())));
    }

    #[test]
    fn test_blank_title_create_is_allowed() {
        // The reducer substitutes the configured default title.
        let list = sessions(0);
        let mut state = SessionPanelState::new();
        let mut panel = SessionPanel::new(&mut state, &list);

        panel.handle_event(&TuiEvent::InputChar('n'));
        let event = panel.handle_event(&TuiEvent::Submit);
        assert_eq!(event, Some(PanelEvent::Create(String::new())));
    }

    #[test]
    fn test_rename_prefills_current_title() {
        let list = sessions(1);
        let mut state = SessionPanelState::new();
        let mut panel = SessionPanel::new(&mut state, &list);

        panel.handle_event(&TuiEvent::InputChar('r'));
        panel.handle_event(&TuiEvent::InputChar('!'));
        let event = panel.handle_event(&TuiEvent::Submit);
        assert_eq!(
            event,
            Some(PanelEvent::Rename {
                id: "id-0".to_string(),
                title: "Session 0!".to_string()
            })
        );
    }

    #[test]
    fn test_focus_points_at_current_session() {
        let list = sessions(3);
        let mut state = SessionPanelState::new();
        state.focus(&list, Some("id-2"));
        assert_eq!(state.selected, 2);
    }
}
