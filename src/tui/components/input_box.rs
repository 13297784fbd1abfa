//! # InputBox Component
//!
//! Multi-line draft editor at the bottom of the chat view.
//!
//! The buffer is internal state; `loading`, `attachment_count`, and the
//! edit-mode flag are props synced from app state each frame. Submit is
//! suppressed while a request is in flight or when the draft is blank with
//! no pending attachments.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Maximum number of text lines shown before the box stops growing.
const MAX_VISIBLE_LINES: u16 = 6;
/// Borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// High-level events emitted by the InputBox.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the draft (Enter).
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    pub buffer: String,
    /// Byte offset of the cursor within `buffer`.
    cursor: usize,
    /// Prop: a chat request is in flight, submit disabled.
    pub loading: bool,
    /// Prop: number of uploaded attachments waiting for the next send.
    pub attachment_count: usize,
    /// Prop: editing an existing message instead of drafting a new one.
    pub editing: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            loading: false,
            attachment_count: 0,
            editing: false,
        }
    }

    /// Preload the buffer (used when editing an existing message).
    pub fn set_text(&mut self, text: String) {
        self.cursor = text.len();
        self.buffer = text;
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Height needed for the current buffer, clamped to the viewport limit.
    pub fn calculate_height(&self, content_width: u16) -> u16 {
        let width = content_width.saturating_sub(2).max(1) as usize;
        let lines = wrapped_lines(&self.buffer, width).len().max(1) as u16;
        lines.min(MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn title(&self) -> String {
        if self.editing {
            String::from("Edit message (Enter save, Esc cancel)")
        } else if self.loading {
            String::from("Input (waiting for reply...)")
        } else if self.attachment_count > 0 {
            format!("Input ({} attachment(s) pending)", self.attachment_count)
        } else {
            String::from("Input")
        }
    }

    /// Cursor (column, row) within the wrapped text.
    fn cursor_rowcol(&self, width: usize) -> (u16, u16) {
        let before = &self.buffer[..self.cursor];
        let lines = wrapped_lines(before, width);
        match lines.last() {
            Some(last) => (
                last.width() as u16,
                lines.len().saturating_sub(1) as u16,
            ),
            None => (0, 0),
        }
    }
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(2).max(1) as usize;
        let lines = wrapped_lines(&self.buffer, width);
        let (cursor_x, cursor_y) = self.cursor_rowcol(width);

        // Scroll so the cursor row stays visible once the buffer outgrows the box
        let visible = area.height.saturating_sub(VERTICAL_OVERHEAD).max(1);
        let scroll = cursor_y.saturating_sub(visible - 1);
        let shown = lines
            .iter()
            .skip(scroll as usize)
            .take(visible as usize)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        let color = if self.editing {
            Color::Yellow
        } else if self.loading {
            Color::DarkGray
        } else {
            Color::Green
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(self.title());
        let paragraph = Paragraph::new(shown)
            .block(block)
            .style(Style::default().fg(color));

        frame.render_widget(paragraph, area);
        frame.set_cursor_position((
            area.x + 1 + cursor_x,
            area.y + 1 + cursor_y - scroll,
        ));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.cursor, text);
                self.cursor += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                if self.cursor > 0 {
                    let prev = prev_char_boundary(&self.buffer, self.cursor);
                    self.buffer.drain(prev..self.cursor);
                    self.cursor = prev;
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::Delete => {
                if self.cursor < self.buffer.len() {
                    let next = next_char_boundary(&self.buffer, self.cursor);
                    self.buffer.drain(self.cursor..next);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorLeft => {
                if self.cursor > 0 {
                    self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                }
                None
            }
            TuiEvent::CursorRight => {
                if self.cursor < self.buffer.len() {
                    self.cursor = next_char_boundary(&self.buffer, self.cursor);
                }
                None
            }
            TuiEvent::CursorHome => {
                self.cursor = self.buffer[..self.cursor]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                None
            }
            TuiEvent::CursorEnd => {
                self.cursor = self.buffer[self.cursor..]
                    .find('\n')
                    .map(|i| self.cursor + i)
                    .unwrap_or(self.buffer.len());
                None
            }
            TuiEvent::Submit => {
                if self.loading {
                    return None;
                }
                if self.buffer.trim().is_empty() && self.attachment_count == 0 {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

/// Wrap `text` at `width` columns, keeping explicit newlines. Always returns
/// at least one (possibly empty) line so cursor math stays simple.
fn wrapped_lines(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.split('\n') {
        if raw.is_empty() {
            out.push(String::new());
            continue;
        }
        for piece in textwrap::wrap(raw, width) {
            out.push(piece.into_owned());
        }
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn prev_char_boundary(s: &str, pos: usize) -> usize {
    let mut p = pos - 1;
    while p > 0 && !s.is_char_boundary(p) {
        p -= 1;
    }
    p
}

fn next_char_boundary(s: &str, pos: usize) -> usize {
    let mut p = pos + 1;
    while p < s.len() && !s.is_char_boundary(p) {
        p += 1;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_and_backspace() {
        let mut input = InputBox::new();
        input.handle_event(&TuiEvent::InputChar('h'));
        input.handle_event(&TuiEvent::InputChar('i'));
        assert_eq!(input.buffer, "hi");
        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.buffer, "h");
    }

    #[test]
    fn test_utf8_backspace_removes_whole_char() {
        let mut input = InputBox::new();
        input.handle_event(&TuiEvent::InputChar('é'));
        input.handle_event(&TuiEvent::Backspace);
        assert!(input.buffer.is_empty());
    }

    #[test]
    fn test_submit_clears_buffer() {
        let mut input = InputBox::new();
        input.set_text("hello".to_string());
        match input.handle_event(&TuiEvent::Submit) {
            Some(InputEvent::Submit(text)) => assert_eq!(text, "hello"),
            other => panic!("expected Submit, got {other:?}"),
        }
        assert!(input.buffer.is_empty());
    }

    #[test]
    fn test_submit_disabled_while_loading() {
        let mut input = InputBox::new();
        input.set_text("hello".to_string());
        input.loading = true;
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
        assert_eq!(input.buffer, "hello");
    }

    #[test]
    fn test_blank_submit_allowed_with_attachments() {
        let mut input = InputBox::new();
        input.attachment_count = 1;
        match input.handle_event(&TuiEvent::Submit) {
            Some(InputEvent::Submit(text)) => assert!(text.is_empty()),
            other => panic!("expected Submit, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_submit_without_attachments_is_noop() {
        let mut input = InputBox::new();
        input.set_text("   ".to_string());
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
    }

    #[test]
    fn test_height_grows_with_content_up_to_cap() {
        let mut input = InputBox::new();
        assert_eq!(input.calculate_height(40), 1 + VERTICAL_OVERHEAD);
        input.set_text("a\n".repeat(20));
        assert_eq!(
            input.calculate_height(40),
            MAX_VISIBLE_LINES + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn test_home_end_respect_lines() {
        let mut input = InputBox::new();
        input.set_text("ab\ncd".to_string());
        input.handle_event(&TuiEvent::CursorHome);
        // Cursor is at start of "cd"; Delete removes 'c'
        input.handle_event(&TuiEvent::Delete);
        assert_eq!(input.buffer, "ab\nd");
    }
}
