//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI, and
//! translates keyboard events into `core::Action` values.
//!
//! This is the only module that knows about ratatui and crossterm. The core
//! reducer and the API client never touch the terminal, so they can be tested
//! headless and the adapter could be swapped out wholesale.
//!
//! ## Redraw strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Busy** (request or upload in flight): draws every ~80ms so the spinner
//!   animates.
//! - **Idle**: sleeps up to 500ms and only redraws on events or resize.

pub mod component;
pub mod components;
pub mod event;
pub mod markdown;
mod ui;

use std::io::stdout;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};

use crate::api::{ApiError, BasicAuth, ChatServer, Credentials, HttpChatServer};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::{
    AttachEvent, AttachPrompt, InputBox, InputEvent, LoginEvent, LoginForm, MessageList,
    MessageListView, ModelPicker, ModelPickerState, PanelEvent, PickerEvent, SessionPanel,
    SessionPanelState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Modal input mode: determines how keyboard events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigate messages with arrow keys. Typing auto-switches to Input.
    Cursor,
    /// Text editing in the input box. Esc switches to Cursor.
    Input,
}

/// Which overlay, if any, currently captures keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Sessions,
    ModelPicker,
    Attach,
}

/// TUI-specific presentation state (not part of core business logic).
pub struct TuiState {
    pub input: InputBox,
    pub messages: MessageList,
    pub panel: SessionPanelState,
    pub picker: ModelPickerState,
    pub attach: AttachPrompt,
    pub overlay: Overlay,
    pub input_mode: InputMode,
    /// Index of the message being edited, if the composer holds an edit.
    pub editing: Option<usize>,
    pub username: String,
    pub spinner_frame: usize,
    confirm_delete_message: bool,
}

impl TuiState {
    pub fn new(username: String) -> Self {
        Self {
            input: InputBox::new(),
            messages: MessageList::new(),
            panel: SessionPanelState::new(),
            picker: ModelPickerState::new(),
            attach: AttachPrompt::new(),
            overlay: Overlay::None,
            input_mode: InputMode::Input, // User expects to type immediately
            editing: None,
            username,
            spinner_frame: 0,
            confirm_delete_message: false,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Enable the Kitty keyboard protocol unconditionally (allows
        // Shift+Enter detection). Terminals that don't support it ignore it.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!(
            "Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)"
        );
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new()?;

    let outcome = login_phase(&mut terminal, &config);
    let result = match outcome {
        Ok(Some((server, username))) => chat_phase(&mut terminal, &config, server, username),
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };

    ratatui::restore();
    result
}

/// Sign-in loop. Returns the authenticated server handle and the username,
/// or `None` if the user quit from the form.
fn login_phase(
    terminal: &mut ratatui::DefaultTerminal,
    config: &ResolvedConfig,
) -> std::io::Result<Option<(Arc<dyn ChatServer>, String)>> {
    let mut form = match &config.username {
        Some(username) => LoginForm::with_username(username),
        None => LoginForm::new(),
    };
    let (tx, rx) = mpsc::channel::<Result<(), ApiError>>();
    let mut candidate: Option<(Arc<dyn ChatServer>, String)> = None;

    // Credentials from config skip straight to the probe
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        let credentials = Credentials::new(username, password);
        candidate = Some(probe_credentials(&config.base_url, &credentials, tx.clone()));
        form.validating = true;
    }

    loop {
        terminal.draw(|f| form.render(f, f.area()))?;

        while let Ok(result) = rx.try_recv() {
            match result {
                Ok(()) => {
                    if let Some(found) = candidate.take() {
                        info!("Signed in as {}", found.1);
                        return Ok(Some(found));
                    }
                }
                Err(e) => {
                    candidate = None;
                    warn!("Login probe failed: {}", e);
                    form.reject(probe_failure_message(&e));
                }
            }
        }

        let Some(event) = poll_event_timeout(std::time::Duration::from_millis(120)) else {
            continue;
        };
        if matches!(event, TuiEvent::ForceQuit | TuiEvent::Quit) {
            return Ok(None);
        }
        if let Some(LoginEvent::Submit(credentials)) = form.handle_event(&event) {
            candidate = Some(probe_credentials(&config.base_url, &credentials, tx.clone()));
        }
    }
}

/// Error line shown in the login form when a probe comes back failed. Any
/// HTTP rejection reads as bad credentials; transport failures carry the
/// underlying error so an unreachable host is distinguishable.
fn probe_failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Api { .. } => "Invalid username or password.".to_string(),
        other => format!("Could not reach server: {other}"),
    }
}

/// Build a server handle for the credentials and probe it in the background.
fn probe_credentials(
    base_url: &str,
    credentials: &Credentials,
    tx: mpsc::Sender<Result<(), ApiError>>,
) -> (Arc<dyn ChatServer>, String) {
    let server: Arc<dyn ChatServer> = Arc::new(HttpChatServer::new(
        base_url,
        Box::new(BasicAuth::new(credentials)),
    ));
    let probe_server = Arc::clone(&server);
    tokio::spawn(async move {
        let _ = tx.send(probe_server.probe().await);
    });
    (server, credentials.username.clone())
}

fn chat_phase(
    terminal: &mut ratatui::DefaultTerminal,
    config: &ResolvedConfig,
    server: Arc<dyn ChatServer>,
    username: String,
) -> std::io::Result<()> {
    let mut app = App::new(server, config.default_session_title.clone());
    let mut tui = TuiState::new(username);

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel::<Action>();

    // Initial load: session list + provider/model catalog
    let effect = update(&mut app, Action::RefreshRequested);
    run_effect(effect, &app, &tx);

    let start_time = std::time::Instant::now();
    let mut last_session_id: Option<String> = None;
    let mut needs_redraw = true;

    loop {
        // Reset the transcript view when the active session changes
        if app.current_session_id != last_session_id {
            last_session_id = app.current_session_id.clone();
            tui.messages.reset();
            tui.editing = None;
            needs_redraw = true;
        }

        let animating = app.is_loading || app.uploading;
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.spinner_frame = (elapsed * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            std::time::Duration::from_millis(80)
        } else {
            std::time::Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);

        let mut should_quit = false;
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if matches!(event, TuiEvent::Resize) {
                continue;
            }

            // Ctrl+C / Ctrl+Q always quit regardless of mode
            if matches!(event, TuiEvent::ForceQuit | TuiEvent::Quit) {
                let effect = update(&mut app, Action::Quit);
                should_quit |= dispatch_effect(effect, &app, &tx);
                continue;
            }

            if handle_chord(&event, &mut app, &mut tui) {
                continue;
            }

            if tui.overlay != Overlay::None {
                handle_overlay_event(&event, &mut app, &mut tui, &tx);
                continue;
            }

            // Scroll events always go to the transcript
            if matches!(
                event,
                TuiEvent::ScrollUp
                    | TuiEvent::ScrollDown
                    | TuiEvent::ScrollPageUp
                    | TuiEvent::ScrollPageDown
            ) {
                let session = app.current_session();
                let empty = Vec::new();
                let messages = session.map(|s| s.messages.as_slice()).unwrap_or(&empty);
                MessageListView::new(&mut tui.messages, messages).handle_event(&event);
                continue;
            }

            match tui.input_mode {
                InputMode::Input => handle_input_mode(&event, &mut app, &mut tui, &tx),
                InputMode::Cursor => handle_cursor_mode(&event, &mut app, &mut tui, &tx),
            }
        }

        if should_quit {
            break;
        }

        // Actions from background tasks
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            let effect = update(&mut app, action);
            if dispatch_effect(effect, &app, &tx) {
                should_quit = true;
            }
        }

        if should_quit {
            break;
        }
    }

    Ok(())
}

/// App-level chords that work in every mode. Returns true when consumed.
fn handle_chord(event: &TuiEvent, app: &mut App, tui: &mut TuiState) -> bool {
    match event {
        TuiEvent::OpenSessionPanel => {
            tui.panel.focus(&app.sessions, app.current_session_id.as_deref());
            tui.overlay = Overlay::Sessions;
            true
        }
        TuiEvent::OpenModelPicker => {
            if app.catalog.is_none() {
                app.status_message = "Catalog not loaded yet.".to_string();
            } else if app.current_session().is_none() {
                app.status_message = "No session selected.".to_string();
            } else if let (Some(catalog), Some(session)) = (&app.catalog, app.current_session()) {
                tui.picker.open(catalog, &session.api_provider, &session.model);
                tui.overlay = Overlay::ModelPicker;
            }
            true
        }
        TuiEvent::AttachFiles => {
            tui.attach = AttachPrompt::new();
            tui.overlay = Overlay::Attach;
            true
        }
        _ => false,
    }
}

fn handle_overlay_event(
    event: &TuiEvent,
    app: &mut App,
    tui: &mut TuiState,
    tx: &mpsc::Sender<Action>,
) {
    match tui.overlay {
        Overlay::None => {}
        Overlay::Sessions => {
            let panel_event = SessionPanel::new(&mut tui.panel, &app.sessions).handle_event(event);
            match panel_event {
                Some(PanelEvent::Select(id)) => {
                    apply(app, Action::SelectSession(id), tx);
                    tui.overlay = Overlay::None;
                }
                Some(PanelEvent::Create(title)) => {
                    apply(app, Action::CreateSession(title), tx);
                    tui.overlay = Overlay::None;
                }
                Some(PanelEvent::Rename { id, title }) => {
                    apply(app, Action::RenameSession { id, title }, tx);
                }
                Some(PanelEvent::Delete(id)) => {
                    apply(app, Action::DeleteSession(id), tx);
                }
                Some(PanelEvent::Dismiss) => tui.overlay = Overlay::None,
                None => {}
            }
        }
        Overlay::ModelPicker => {
            let Some(catalog) = &app.catalog else {
                tui.overlay = Overlay::None;
                return;
            };
            let picker_event = ModelPicker::new(&mut tui.picker, catalog).handle_event(event);
            match picker_event {
                Some(PickerEvent::SetProvider(provider)) => {
                    apply(
                        app,
                        Action::UpdateSessionConfig(crate::api::SessionUpdate {
                            api_provider: Some(provider),
                            model: Some(String::new()),
                            ..Default::default()
                        }),
                        tx,
                    );
                }
                Some(PickerEvent::SetModel(model)) => {
                    apply(
                        app,
                        Action::UpdateSessionConfig(crate::api::SessionUpdate {
                            model: Some(model),
                            ..Default::default()
                        }),
                        tx,
                    );
                    tui.overlay = Overlay::None;
                }
                Some(PickerEvent::Dismiss) => tui.overlay = Overlay::None,
                None => {}
            }
        }
        Overlay::Attach => match tui.attach.handle_event(event) {
            Some(AttachEvent::Upload(paths)) => {
                apply(app, Action::UploadRequested(paths), tx);
                tui.overlay = Overlay::None;
            }
            Some(AttachEvent::Dismiss) => tui.overlay = Overlay::None,
            None => {}
        },
    }
}

fn handle_input_mode(
    event: &TuiEvent,
    app: &mut App,
    tui: &mut TuiState,
    tx: &mpsc::Sender<Action>,
) {
    if matches!(event, TuiEvent::Escape) {
        // Esc clears an error first, then an in-progress edit, then
        // switches to Cursor mode.
        if app.error.is_some() {
            apply(app, Action::DismissError, tx);
        } else if tui.editing.is_some() {
            tui.editing = None;
            tui.input.clear();
        } else {
            tui.input_mode = InputMode::Cursor;
        }
        return;
    }

    if matches!(event, TuiEvent::ClearSession) {
        apply(app, Action::ClearMessages, tx);
        return;
    }

    if let Some(input_event) = tui.input.handle_event(event) {
        match input_event {
            InputEvent::Submit(text) => match tui.editing.take() {
                Some(index) => {
                    apply(app, Action::EditMessage { index, content: text }, tx);
                    tui.input.clear();
                }
                None => {
                    apply(app, Action::SubmitMessage(text), tx);
                    tui.input.clear();
                    tui.messages.reset();
                }
            },
            InputEvent::ContentChanged => {}
        }
    }
}

fn handle_cursor_mode(
    event: &TuiEvent,
    app: &mut App,
    tui: &mut TuiState,
    tx: &mpsc::Sender<Action>,
) {
    // A pending message delete is cancelled by any key but 'd'
    if !matches!(event, TuiEvent::InputChar('d')) {
        tui.confirm_delete_message = false;
    }

    match event {
        TuiEvent::Escape => {
            if app.error.is_some() {
                apply(app, Action::DismissError, tx);
            } else {
                tui.messages.clear_selection();
            }
        }
        TuiEvent::ClearSession => apply(app, Action::ClearMessages, tx),
        // End in Cursor mode re-enables stick-to-bottom
        TuiEvent::CursorEnd => {
            tui.messages.reset();
        }
        TuiEvent::CursorUp | TuiEvent::CursorDown => {
            let session = app.current_session();
            let empty = Vec::new();
            let messages = session.map(|s| s.messages.as_slice()).unwrap_or(&empty);
            MessageListView::new(&mut tui.messages, messages).handle_event(event);
        }
        TuiEvent::InputChar('e') => {
            if let Some(index) = tui.messages.selected
                && let Some(message) = app
                    .current_session()
                    .and_then(|s| s.messages.get(index))
            {
                tui.input.set_text(message.content.clone());
                tui.editing = Some(index);
                tui.input_mode = InputMode::Input;
            }
        }
        TuiEvent::InputChar('d') => {
            if let Some(index) = tui.messages.selected {
                if tui.confirm_delete_message {
                    tui.confirm_delete_message = false;
                    tui.messages.clear_selection();
                    apply(app, Action::DeleteMessage { index }, tx);
                } else {
                    tui.confirm_delete_message = true;
                    app.status_message = "Press d again to delete the message.".to_string();
                }
            }
        }
        // Typing auto-switches to Input mode and forwards the event
        TuiEvent::InputChar(_) | TuiEvent::Paste(_) => {
            tui.input_mode = InputMode::Input;
            tui.messages.clear_selection();
            tui.input.handle_event(event);
        }
        TuiEvent::Submit => {
            tui.input_mode = InputMode::Input;
            tui.messages.clear_selection();
        }
        _ => {}
    }
}

/// Run the reducer and execute the resulting effect.
fn apply(app: &mut App, action: Action, tx: &mpsc::Sender<Action>) {
    let effect = update(app, action);
    dispatch_effect(effect, app, tx);
}

fn dispatch_effect(effect: Effect, app: &App, tx: &mpsc::Sender<Action>) -> bool {
    if effect == Effect::Quit {
        return true;
    }
    run_effect(effect, app, tx);
    false
}

/// Spawn the network work an effect asks for. Results come back as actions.
fn run_effect(effect: Effect, app: &App, tx: &mpsc::Sender<Action>) {
    let server = Arc::clone(&app.server);
    let tx = tx.clone();
    match effect {
        Effect::None | Effect::Quit => {}
        Effect::Refresh => {
            let catalog_server = Arc::clone(&server);
            let catalog_tx = tx.clone();
            tokio::spawn(async move {
                let action = match server.list_sessions().await {
                    Ok(sessions) => Action::SessionsListed(sessions),
                    Err(e) => Action::RequestFailed(format!("Could not load sessions: {e}")),
                };
                let _ = tx.send(action);
            });
            tokio::spawn(async move {
                let action = match catalog_server.fetch_config().await {
                    Ok(catalog) => Action::CatalogFetched(catalog),
                    Err(e) => Action::RequestFailed(format!("Could not load catalog: {e}")),
                };
                let _ = catalog_tx.send(action);
            });
        }
        Effect::CreateSession(title) => {
            tokio::spawn(async move {
                let action = match server.create_session(&title).await {
                    Ok(session) => Action::SessionCreated(session),
                    Err(e) => Action::RequestFailed(format!("Could not create session: {e}")),
                };
                let _ = tx.send(action);
            });
        }
        Effect::DeleteSession(id) => {
            tokio::spawn(async move {
                let action = match server.delete_session(&id).await {
                    Ok(()) => Action::SessionDeleted(id),
                    Err(e) => Action::RequestFailed(format!("Could not delete session: {e}")),
                };
                let _ = tx.send(action);
            });
        }
        Effect::UpdateSession { id, update } => {
            tokio::spawn(async move {
                let action = match server.update_session(&id, &update).await {
                    Ok(session) => Action::SessionUpdated(session),
                    Err(e) => Action::RequestFailed(format!("Could not update session: {e}")),
                };
                let _ = tx.send(action);
            });
        }
        Effect::SendChat(request) => {
            tokio::spawn(async move {
                let session_id = request.session_id.clone();
                let action = match server.send_chat(&request).await {
                    Ok(reply) => Action::ChatReplied(reply),
                    Err(e) => Action::ChatFailed {
                        session_id,
                        error: e.to_string(),
                    },
                };
                let _ = tx.send(action);
            });
        }
        Effect::ClearMessages(id) => {
            tokio::spawn(async move {
                let action = match server.clear_messages(&id).await {
                    Ok(session) => Action::MessagesCleared(session),
                    Err(e) => Action::RequestFailed(format!("Could not clear messages: {e}")),
                };
                let _ = tx.send(action);
            });
        }
        Effect::Upload(paths) => {
            tokio::spawn(upload_batch(server, paths, tx));
        }
    }
}

/// Upload files one at a time, in order. The first failure aborts the
/// remaining uploads so attachments never arrive partially out of order.
pub async fn upload_batch(
    server: Arc<dyn ChatServer>,
    paths: Vec<PathBuf>,
    tx: mpsc::Sender<Action>,
) {
    for path in paths {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(Action::UploadFailed(format!(
                    "Could not read {}: {e}",
                    path.display()
                )));
                return;
            }
        };
        match server.upload_file(&filename, bytes).await {
            Ok(response) => {
                let _ = tx.send(Action::AttachmentUploaded(response.file_url));
            }
            Err(e) => {
                let _ = tx.send(Action::UploadFailed(format!(
                    "Upload of {filename} failed: {e}"
                )));
                return;
            }
        }
    }
    let _ = tx.send(Action::UploadFinished);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_http_rejection_reads_as_bad_credentials() {
        for status in [401, 403, 500] {
            let error = ApiError::Api {
                status,
                message: "nope".to_string(),
            };
            assert_eq!(probe_failure_message(&error), "Invalid username or password.");
        }
    }

    #[test]
    fn test_transport_failure_keeps_underlying_error() {
        let error = ApiError::Network("connection refused".to_string());
        assert_eq!(
            probe_failure_message(&error),
            "Could not reach server: network error: connection refused"
        );
    }
}
