//! Scrollable transcript of the current session.
//!
//! Persistent state (`MessageList`) holds the scroll position and the
//! optional keyboard selection used for editing and deleting messages.
//! Heights are recomputed per frame from the message data, so the list
//! stays correct when the terminal resizes or messages change underneath.

use ratatui::Frame;
use ratatui::layout::{Rect, Size};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::api::Message as ApiMessage;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageView;
use crate::tui::event::TuiEvent;

/// Rows per PageUp/PageDown step.
const PAGE_STEP: u16 = 10;

#[derive(Default)]
pub struct MessageList {
    scroll: ScrollViewState,
    /// When true the view follows new content as it arrives.
    stick_to_bottom: bool,
    /// Index into the session's messages, when navigating with the keyboard.
    pub selected: Option<usize>,
    last_content_height: u16,
    last_viewport_height: u16,
}

impl MessageList {
    pub fn new() -> Self {
        Self {
            stick_to_bottom: true,
            ..Self::default()
        }
    }

    /// Drop selection and snap back to following the transcript tail.
    /// Called when the session changes or a reply lands.
    pub fn reset(&mut self) {
        self.selected = None;
        self.stick_to_bottom = true;
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn max_offset(&self) -> u16 {
        self.last_content_height
            .saturating_sub(self.last_viewport_height)
    }

    fn scroll_up(&mut self, rows: u16) {
        self.stick_to_bottom = false;
        let y = self.scroll.offset().y.saturating_sub(rows);
        self.scroll.set_offset((0, y).into());
    }

    fn scroll_down(&mut self, rows: u16) {
        let y = (self.scroll.offset().y + rows).min(self.max_offset());
        self.scroll.set_offset((0, y).into());
        if y >= self.max_offset() {
            self.stick_to_bottom = true;
        }
    }

    fn select_prev(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.stick_to_bottom = false;
        self.selected = Some(match self.selected {
            Some(i) => i.saturating_sub(1),
            None => len - 1,
        });
    }

    fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        match self.selected {
            Some(i) if i + 1 < len => self.selected = Some(i + 1),
            Some(_) => {
                // Past the last message: back to follow mode.
                self.reset();
            }
            None => {}
        }
    }
}

pub struct MessageListView<'a> {
    state: &'a mut MessageList,
    messages: &'a [ApiMessage],
}

impl<'a> MessageListView<'a> {
    pub fn new(state: &'a mut MessageList, messages: &'a [ApiMessage]) -> Self {
        Self { state, messages }
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect) {
        let hint = Paragraph::new(vec![
            Line::default(),
            Line::from("No messages yet.").centered(),
            Line::from("Type below and press Enter to start the conversation.")
                .centered()
                .style(Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(hint, area);
    }
}

impl Component for MessageListView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.messages.is_empty() {
            self.state.last_content_height = 0;
            self.state.last_viewport_height = area.height;
            self.render_empty(frame, area);
            return;
        }

        // Scrollbar steals a column; lay out against the narrower width.
        let content_width = area.width.saturating_sub(1);
        let heights: Vec<u16> = self
            .messages
            .iter()
            .map(|m| MessageView::new(m, false).calculate_height(content_width))
            .collect();
        let total: u16 = heights.iter().sum();

        let mut scroll_view = ScrollView::new(Size::new(content_width, total))
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y = 0u16;
        let mut selected_top = None;
        for (i, message) in self.messages.iter().enumerate() {
            let selected = self.state.selected == Some(i);
            if selected {
                selected_top = Some((y, heights[i]));
            }
            let rect = Rect::new(0, y, content_width, heights[i]);
            scroll_view.render_widget(MessageView::new(message, selected), rect);
            y += heights[i];
        }

        self.state.last_content_height = total;
        self.state.last_viewport_height = area.height;

        if let Some((top, height)) = selected_top {
            // Keep the selected message in view.
            let offset = self.state.scroll.offset().y;
            if top < offset {
                self.state.scroll.set_offset((0, top).into());
            } else if top + height > offset + area.height {
                let y = (top + height).saturating_sub(area.height);
                self.state.scroll.set_offset((0, y).into());
            }
        } else if self.state.stick_to_bottom {
            self.state.scroll.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll);
    }
}

impl EventHandler for MessageListView<'_> {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => self.state.scroll_up(1),
            TuiEvent::ScrollDown => self.state.scroll_down(1),
            TuiEvent::ScrollPageUp => self.state.scroll_up(PAGE_STEP),
            TuiEvent::ScrollPageDown => self.state.scroll_down(PAGE_STEP),
            TuiEvent::CursorUp => self.state.select_prev(self.messages.len()),
            TuiEvent::CursorDown => self.state.select_next(self.messages.len()),
            _ => return None,
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assistant_message, user_message};

    fn messages(n: usize) -> Vec<ApiMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    user_message(&format!("question {i}"))
                } else {
                    assistant_message(&format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn test_select_prev_starts_at_last_message() {
        let mut list = MessageList::new();
        list.select_prev(4);
        assert_eq!(list.selected, Some(3));
        assert!(!list.stick_to_bottom);
    }

    #[test]
    fn test_select_next_past_end_resets_to_follow_mode() {
        let mut list = MessageList::new();
        list.selected = Some(3);
        list.select_next(4);
        assert_eq!(list.selected, None);
        assert!(list.stick_to_bottom);
    }

    #[test]
    fn test_scroll_up_breaks_stickiness() {
        let mut list = MessageList::new();
        list.last_content_height = 50;
        list.last_viewport_height = 10;
        assert!(list.stick_to_bottom);

        let msgs = messages(2);
        let mut view = MessageListView::new(&mut list, &msgs);
        view.handle_event(&TuiEvent::ScrollUp);
        assert!(!list.stick_to_bottom);
    }

    #[test]
    fn test_scroll_down_to_end_restores_stickiness() {
        let mut list = MessageList::new();
        list.stick_to_bottom = false;
        list.last_content_height = 30;
        list.last_viewport_height = 10;
        list.scroll.set_offset((0, 19).into());

        let msgs = messages(2);
        let mut view = MessageListView::new(&mut list, &msgs);
        view.handle_event(&TuiEvent::ScrollDown);
        assert!(list.stick_to_bottom);
    }

    #[test]
    fn test_unhandled_event_returns_none() {
        let mut list = MessageList::new();
        let msgs = messages(1);
        let mut view = MessageListView::new(&mut list, &msgs);
        assert!(view.handle_event(&TuiEvent::Tab).is_none());
    }
}
