//! Frame layout for the chat screen.
//!
//! One row of title bar, the transcript in the middle, a one-line banner for
//! errors or status underneath, and the composer at the bottom sized to its
//! content. Overlays (sessions, model picker, attach prompt) draw last, on
//! top of everything.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::core::state::App;
use crate::tui::component::Component;
use crate::tui::components::{MessageListView, ModelPicker, SessionPanel, TitleBar};
use crate::tui::{Overlay, TuiState};

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};

    let input_height = tui
        .input
        .calculate_height(frame.area().width.saturating_sub(2));
    let banner_height = if app.error.is_some() || !app.status_message.is_empty() {
        1
    } else {
        0
    };
    let [title_area, main_area, banner_area, input_area] = Layout::vertical([
        Length(1),
        Min(0),
        Length(banner_height),
        Length(input_height),
    ])
    .areas(frame.area());

    let session = app.current_session();
    TitleBar {
        session_title: session.map(|s| s.title.as_str()),
        provider: session.map(|s| s.api_provider.as_str()).filter(|p| !p.is_empty()),
        model: session.map(|s| s.model.as_str()),
        username: &tui.username,
        is_loading: app.is_loading || app.uploading,
        spinner_frame: tui.spinner_frame,
    }
    .render(frame, title_area);

    let empty = Vec::new();
    let messages = session.map(|s| s.messages.as_slice()).unwrap_or(&empty);
    MessageListView::new(&mut tui.messages, messages).render(frame, main_area);

    if banner_height > 0 {
        draw_banner(frame, banner_area, app);
    }

    tui.input.loading = app.is_loading;
    tui.input.attachment_count = app.pending_attachments.len();
    tui.input.editing = tui.editing.is_some();
    tui.input.render(frame, input_area);

    match tui.overlay {
        Overlay::None => {}
        Overlay::Sessions => {
            SessionPanel::new(&mut tui.panel, &app.sessions).render(frame, main_area);
        }
        Overlay::ModelPicker => {
            if let Some(catalog) = &app.catalog {
                ModelPicker::new(&mut tui.picker, catalog).render(frame, main_area);
            }
        }
        Overlay::Attach => tui.attach.render(frame, main_area),
    }
}

fn draw_banner(frame: &mut Frame, area: Rect, app: &App) {
    let line = match &app.error {
        Some(error) => Line::styled(
            format!(" {error}  (Esc to dismiss)"),
            Style::default().fg(Color::White).bg(Color::Red),
        ),
        None => Line::styled(
            format!(" {}", app.status_message),
            Style::default().fg(Color::DarkGray),
        ),
    };
    frame.render_widget(Paragraph::new(line), area);
}
