//! # Actions
//!
//! Everything that can happen in the client becomes an `Action`. User hits
//! Enter? That's `Action::SubmitMessage`. The server answers a `/chat` call?
//! That's `Action::ChatReplied`.
//!
//! The `update()` function takes the current state and an action, mutates the
//! state, and returns the `Effect` the event loop should execute. All network
//! I/O happens outside the reducer; completions come back as further actions.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! This makes every state transition testable without a server, and keeps the
//! invariant that the active session and its session-list entry never diverge
//! (both are the same `Vec` slot, found by id).

use std::path::PathBuf;

use log::{debug, info};

use crate::api::{ChatReply, ChatRequest, Delivery, Message, ServerConfig, Session, SessionUpdate};
use crate::core::state::App;

#[derive(Debug)]
pub enum Action {
    /// Re-fetch the session list and the provider/model catalog.
    RefreshRequested,
    SessionsListed(Vec<Session>),
    CatalogFetched(ServerConfig),

    /// User asked for a new session with this (possibly blank) title.
    CreateSession(String),
    SessionCreated(Session),
    /// Pure local switch, no network call.
    SelectSession(String),
    DeleteSession(String),
    SessionDeleted(String),
    /// Partial provider/model update for the active session.
    UpdateSessionConfig(SessionUpdate),
    /// Retitle any session, active or not.
    RenameSession { id: String, title: String },
    SessionUpdated(Session),

    SubmitMessage(String),
    ChatReplied(ChatReply),
    ChatFailed { session_id: String, error: String },
    ClearMessages,
    MessagesCleared(Session),

    /// Local-only edit of a cached message (no backend endpoint exists).
    EditMessage { index: usize, content: String },
    /// Local-only delete of a cached message.
    DeleteMessage { index: usize },

    UploadRequested(Vec<PathBuf>),
    AttachmentUploaded(String),
    UploadFinished,
    UploadFailed(String),

    RequestFailed(String),
    DismissError,
    Quit,
}

/// Side effects the event loop executes after a reducer step. Each network
/// effect becomes a spawned task whose result is fed back as an `Action`.
#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    /// Fetch sessions and catalog (two independent requests).
    Refresh,
    CreateSession(String),
    DeleteSession(String),
    UpdateSession { id: String, update: SessionUpdate },
    SendChat(ChatRequest),
    ClearMessages(String),
    Upload(Vec<PathBuf>),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::RefreshRequested => Effect::Refresh,

        Action::SessionsListed(sessions) => {
            app.sessions = sessions;
            // Keep the current selection if it survived the refresh,
            // otherwise fall back to the first session (or none).
            let still_there = app
                .current_session_id
                .as_deref()
                .is_some_and(|id| app.sessions.iter().any(|s| s.id == id));
            if !still_there {
                app.current_session_id = app.sessions.first().map(|s| s.id.clone());
            }
            debug!("Session list replaced: {} sessions", app.sessions.len());
            // The catalog fetch may have landed first; the newly selected
            // session still needs the defaults in that order.
            apply_catalog_defaults(app);
            Effect::None
        }

        Action::CatalogFetched(catalog) => {
            app.catalog = Some(catalog);
            apply_catalog_defaults(app);
            Effect::None
        }

        Action::CreateSession(title) => {
            let title = title.trim().to_string();
            let title = if title.is_empty() {
                app.default_session_title.clone()
            } else {
                title
            };
            Effect::CreateSession(title)
        }

        Action::SessionCreated(session) => {
            info!("Session created: {} ({})", session.title, session.id);
            let id = session.id.clone();
            app.reconcile_session(session);
            app.current_session_id = Some(id);
            Effect::None
        }

        Action::SelectSession(id) => {
            if app.sessions.iter().any(|s| s.id == id) {
                app.current_session_id = Some(id);
            }
            Effect::None
        }

        Action::DeleteSession(id) => Effect::DeleteSession(id),

        Action::SessionDeleted(id) => {
            app.sessions.retain(|s| s.id != id);
            if app.current_session_id.as_deref() == Some(&id) {
                app.current_session_id = app.sessions.first().map(|s| s.id.clone());
            }
            Effect::None
        }

        Action::UpdateSessionConfig(update) => match app.current_session_id.clone() {
            Some(id) => Effect::UpdateSession { id, update },
            None => Effect::None,
        },

        Action::RenameSession { id, title } => Effect::UpdateSession {
            id,
            update: SessionUpdate {
                title: Some(title),
                ..SessionUpdate::default()
            },
        },

        Action::SessionUpdated(session) => {
            // The server's full session object replaces both the active
            // session (same id) and the list entry in one step.
            app.reconcile_session(session);
            Effect::None
        }

        Action::SubmitMessage(text) => {
            if app.is_loading {
                return Effect::None;
            }
            if text.trim().is_empty() && app.pending_attachments.is_empty() {
                return Effect::None;
            }
            // Attachments are only consumed once the send is actually going out
            let Some(session_id) = app.current_session_id.clone() else {
                app.error = Some("No active session".to_string());
                return Effect::None;
            };
            let attachments = std::mem::take(&mut app.pending_attachments);

            // Optimistic append; the session list entry is the same slot, so
            // the mirror invariant holds for free.
            let message = Message::pending_user(text.clone(), attachments.clone());
            if let Some(session) = app.current_session_mut() {
                session.messages.push(message);
            }
            app.is_loading = true;
            app.error = None;
            app.status_message = String::from("Waiting for reply...");

            Effect::SendChat(ChatRequest {
                message: text,
                session_id,
                file_urls: if attachments.is_empty() {
                    None
                } else {
                    Some(attachments)
                },
            })
        }

        Action::ChatReplied(reply) => {
            app.is_loading = false;
            app.status_message = String::from("Ready");
            app.reconcile_session(reply.session);
            Effect::None
        }

        Action::ChatFailed { session_id, error } => {
            app.is_loading = false;
            app.error = Some(error);
            app.status_message = String::from("Send failed");
            // Mark the optimistic message instead of silently leaving it
            // looking sent. No rollback: the user can see what happened.
            if let Some(session) = app.sessions.iter_mut().find(|s| s.id == session_id)
                && let Some(message) = session
                    .messages
                    .iter_mut()
                    .rev()
                    .find(|m| m.delivery == Delivery::Pending)
            {
                message.delivery = Delivery::Failed;
            }
            Effect::None
        }

        Action::ClearMessages => match app.current_session_id.clone() {
            Some(id) => Effect::ClearMessages(id),
            None => Effect::None,
        },

        Action::MessagesCleared(session) => {
            app.reconcile_session(session);
            app.status_message = String::from("Messages cleared");
            Effect::None
        }

        Action::EditMessage { index, content } => {
            if let Some(session) = app.current_session_mut()
                && let Some(message) = session.messages.get_mut(index)
            {
                message.content = content;
            }
            Effect::None
        }

        Action::DeleteMessage { index } => {
            if let Some(session) = app.current_session_mut()
                && index < session.messages.len()
            {
                session.messages.remove(index);
            }
            Effect::None
        }

        Action::UploadRequested(paths) => {
            if app.uploading || paths.is_empty() {
                return Effect::None;
            }
            app.uploading = true;
            app.status_message = format!("Uploading {} file(s)...", paths.len());
            Effect::Upload(paths)
        }

        Action::AttachmentUploaded(url) => {
            debug!("Attachment uploaded: {url}");
            app.pending_attachments.push(url);
            Effect::None
        }

        Action::UploadFinished => {
            app.uploading = false;
            app.status_message = format!(
                "{} attachment(s) ready to send",
                app.pending_attachments.len()
            );
            Effect::None
        }

        Action::UploadFailed(error) => {
            // The upload task has already aborted the rest of the batch;
            // URLs collected before the failure stay pending.
            app.uploading = false;
            app.error = Some(error);
            Effect::None
        }

        Action::RequestFailed(error) => {
            app.is_loading = false;
            app.error = Some(error);
            Effect::None
        }

        Action::DismissError => {
            app.error = None;
            Effect::None
        }

        Action::Quit => Effect::Quit,
    }
}

/// Fill missing provider/model on the cached active session from the catalog
/// defaults. Local only, no write is issued; the next explicit picker change
/// persists values to the server.
fn apply_catalog_defaults(app: &mut App) {
    let Some(catalog) = &app.catalog else {
        return;
    };
    let default_provider = catalog.default_provider.clone();
    let default_model = catalog.default_model.clone();
    if let Some(session) = app.current_session_mut() {
        if session.api_provider.is_empty() {
            session.api_provider = default_provider;
        }
        if session.model.is_empty()
            && let Some(model) = default_model
        {
            session.model = model;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{reply, session, session_with_messages, test_app};

    // ── Session list ────────────────────────────────────────────────────

    #[test]
    fn test_list_selects_first_when_nothing_active() {
        let mut app = test_app();
        let effect = update(
            &mut app,
            Action::SessionsListed(vec![session("s1", "A"), session("s2", "B")]),
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(app.current_session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_list_keeps_surviving_selection() {
        let mut app = test_app();
        app.current_session_id = Some("s2".to_string());
        update(
            &mut app,
            Action::SessionsListed(vec![session("s1", "A"), session("s2", "B")]),
        );
        assert_eq!(app.current_session_id.as_deref(), Some("s2"));
    }

    #[test]
    fn test_rename_targets_named_session_not_active_one() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A"), session("s2", "B")];
        app.current_session_id = Some("s1".to_string());

        let effect = update(
            &mut app,
            Action::RenameSession {
                id: "s2".to_string(),
                title: "Renamed".to_string(),
            },
        );
        assert_eq!(
            effect,
            Effect::UpdateSession {
                id: "s2".to_string(),
                update: SessionUpdate {
                    title: Some("Renamed".to_string()),
                    ..SessionUpdate::default()
                },
            }
        );
    }

    #[test]
    fn test_empty_list_clears_selection() {
        let mut app = test_app();
        app.current_session_id = Some("gone".to_string());
        update(&mut app, Action::SessionsListed(vec![]));
        assert!(app.current_session_id.is_none());
    }

    // ── Create ──────────────────────────────────────────────────────────

    #[test]
    fn test_blank_title_falls_back_to_default() {
        let mut app = test_app();
        let effect = update(&mut app, Action::CreateSession("   ".to_string()));
        assert_eq!(effect, Effect::CreateSession("New chat".to_string()));
    }

    #[test]
    fn test_created_session_is_active_and_appears_once() {
        let mut app = test_app();
        app.sessions.push(session("s1", "Old"));
        app.current_session_id = Some("s1".to_string());

        update(&mut app, Action::SessionCreated(session("s2", "Fresh")));

        assert_eq!(app.current_session_id.as_deref(), Some("s2"));
        let count = app.sessions.iter().filter(|s| s.id == "s2").count();
        assert_eq!(count, 1);
    }

    // ── Delete ──────────────────────────────────────────────────────────

    #[test]
    fn test_deleting_active_session_selects_first_remaining() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A"), session("s2", "B"), session("s3", "C")];
        app.current_session_id = Some("s2".to_string());

        update(&mut app, Action::SessionDeleted("s2".to_string()));

        assert_eq!(app.sessions.len(), 2);
        assert_eq!(app.current_session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_deleting_last_session_clears_selection() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());

        update(&mut app, Action::SessionDeleted("s1".to_string()));

        assert!(app.sessions.is_empty());
        assert!(app.current_session_id.is_none());
    }

    #[test]
    fn test_deleting_inactive_session_keeps_selection() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A"), session("s2", "B")];
        app.current_session_id = Some("s1".to_string());

        update(&mut app, Action::SessionDeleted("s2".to_string()));

        assert_eq!(app.current_session_id.as_deref(), Some("s1"));
    }

    // ── Send message ────────────────────────────────────────────────────

    #[test]
    fn test_submit_while_loading_is_noop() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());
        app.is_loading = true;

        let effect = update(&mut app, Action::SubmitMessage("hello".to_string()));

        assert_eq!(effect, Effect::None);
        assert!(app.sessions[0].messages.is_empty());
    }

    #[test]
    fn test_submit_appends_pending_message_and_mirrors_into_list() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());

        let effect = update(&mut app, Action::SubmitMessage("hello".to_string()));

        assert!(matches!(effect, Effect::SendChat(ref req) if req.session_id == "s1"));
        assert!(app.is_loading);
        let listed = app.sessions.iter().find(|s| s.id == "s1").unwrap();
        assert_eq!(listed.messages.len(), 1);
        assert_eq!(listed.messages[0].delivery, Delivery::Pending);
        assert_eq!(
            app.current_session().unwrap().messages,
            listed.messages,
            "active session and list entry must stay consistent"
        );
    }

    #[test]
    fn test_submit_attaches_and_clears_pending_uploads() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());
        app.pending_attachments = vec!["/files/a.png".to_string()];

        let effect = update(&mut app, Action::SubmitMessage("see attachment".to_string()));

        match effect {
            Effect::SendChat(req) => {
                assert_eq!(req.file_urls, Some(vec!["/files/a.png".to_string()]));
            }
            other => panic!("expected SendChat, got {other:?}"),
        }
        assert!(app.pending_attachments.is_empty());
    }

    #[test]
    fn test_send_effect_carries_exact_request() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());

        let effect = update(&mut app, Action::SubmitMessage("hi".to_string()));

        assert_eq!(
            effect,
            Effect::SendChat(ChatRequest {
                message: "hi".to_string(),
                session_id: "s1".to_string(),
                file_urls: None,
            })
        );
    }

    #[test]
    fn test_submit_without_session_keeps_attachments() {
        let mut app = test_app();
        app.pending_attachments = vec!["/files/a.png".to_string()];

        let effect = update(&mut app, Action::SubmitMessage("hello".to_string()));

        assert_eq!(effect, Effect::None);
        assert_eq!(app.error.as_deref(), Some("No active session"));
        assert_eq!(
            app.pending_attachments,
            vec!["/files/a.png".to_string()],
            "uploads must survive until a send actually goes out"
        );
    }

    #[test]
    fn test_blank_submit_without_attachments_is_noop() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());

        let effect = update(&mut app, Action::SubmitMessage("   ".to_string()));

        assert_eq!(effect, Effect::None);
        assert!(!app.is_loading);
    }

    #[test]
    fn test_reply_replaces_session_with_server_copy() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());
        update(&mut app, Action::SubmitMessage("hi".to_string()));

        // Server returns the authoritative session: user + assistant pair
        let effect = update(&mut app, Action::ChatReplied(reply("s1", &["hi", "hello!"])));

        assert_eq!(effect, Effect::None);
        assert!(!app.is_loading);
        let active = app.current_session().unwrap();
        assert_eq!(active.messages.len(), 2);
        assert!(active.messages.iter().all(|m| m.delivery == Delivery::Sent));
        let listed = app.sessions.iter().find(|s| s.id == "s1").unwrap();
        assert_eq!(listed.messages.len(), 2);
    }

    #[test]
    fn test_failed_send_marks_optimistic_message() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());
        update(&mut app, Action::SubmitMessage("hi".to_string()));

        update(
            &mut app,
            Action::ChatFailed {
                session_id: "s1".to_string(),
                error: "network error: connection refused".to_string(),
            },
        );

        assert!(!app.is_loading);
        assert!(app.error.is_some());
        let msg = &app.current_session().unwrap().messages[0];
        assert_eq!(msg.delivery, Delivery::Failed);
    }

    // ── Session config ──────────────────────────────────────────────────

    #[test]
    fn test_update_config_targets_active_session() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());

        let effect = update(
            &mut app,
            Action::UpdateSessionConfig(SessionUpdate {
                api_provider: Some("deepseek".to_string()),
                model: Some(String::new()),
                ..Default::default()
            }),
        );

        match effect {
            Effect::UpdateSession { id, update } => {
                assert_eq!(id, "s1");
                assert_eq!(update.api_provider.as_deref(), Some("deepseek"));
            }
            other => panic!("expected UpdateSession, got {other:?}"),
        }
        // Nothing mutated until the server answers
        assert!(app.sessions[0].api_provider.is_empty());
    }

    #[test]
    fn test_server_response_is_authoritative_for_model() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());

        // Client pushed {provider, model: ""}; server filled in its default
        let mut updated = session("s1", "A");
        updated.api_provider = "deepseek".to_string();
        updated.model = "deepseek-chat".to_string();
        update(&mut app, Action::SessionUpdated(updated));

        let active = app.current_session().unwrap();
        assert_eq!(active.model, "deepseek-chat");
        assert_eq!(app.sessions[0].model, "deepseek-chat");
    }

    // ── Catalog defaults ────────────────────────────────────────────────

    #[test]
    fn test_catalog_fills_missing_session_defaults_locally() {
        let mut app = test_app();
        app.sessions = vec![session("s1", "A")];
        app.current_session_id = Some("s1".to_string());

        let catalog: ServerConfig = serde_json::from_str(
            r#"{"providers": ["openai"], "models": {"openai": ["gpt-4o"]},
                "default_provider": "openai", "default_model": "gpt-4o"}"#,
        )
        .unwrap();
        let effect = update(&mut app, Action::CatalogFetched(catalog));

        assert_eq!(effect, Effect::None, "defaults must not trigger a write");
        let active = app.current_session().unwrap();
        assert_eq!(active.api_provider, "openai");
        assert_eq!(active.model, "gpt-4o");
    }

    #[test]
    fn test_catalog_defaults_reach_sessions_listed_later() {
        let mut app = test_app();

        let catalog: ServerConfig = serde_json::from_str(
            r#"{"providers": ["openai"], "models": {"openai": ["gpt-4o"]},
                "default_provider": "openai", "default_model": "gpt-4o"}"#,
        )
        .unwrap();
        // Catalog arrives while the session list is still in flight
        update(&mut app, Action::CatalogFetched(catalog));
        update(&mut app, Action::SessionsListed(vec![session("s1", "A")]));

        let active = app.current_session().unwrap();
        assert_eq!(active.api_provider, "openai");
        assert_eq!(active.model, "gpt-4o");
    }

    // ── Clear / edit / delete messages ──────────────────────────────────

    #[test]
    fn test_clear_messages_roundtrip() {
        let mut app = test_app();
        app.sessions = vec![session_with_messages("s1", &["a", "b"])];
        app.current_session_id = Some("s1".to_string());

        let effect = update(&mut app, Action::ClearMessages);
        assert_eq!(effect, Effect::ClearMessages("s1".to_string()));

        update(&mut app, Action::MessagesCleared(session("s1", "A")));
        assert!(app.current_session().unwrap().messages.is_empty());
    }

    #[test]
    fn test_edit_message_in_place() {
        let mut app = test_app();
        app.sessions = vec![session_with_messages("s1", &["first", "second"])];
        app.current_session_id = Some("s1".to_string());

        update(
            &mut app,
            Action::EditMessage {
                index: 1,
                content: "rewritten".to_string(),
            },
        );

        assert_eq!(app.current_session().unwrap().messages[1].content, "rewritten");
    }

    #[test]
    fn test_delete_message_out_of_bounds_is_noop() {
        let mut app = test_app();
        app.sessions = vec![session_with_messages("s1", &["only"])];
        app.current_session_id = Some("s1".to_string());

        update(&mut app, Action::DeleteMessage { index: 5 });
        assert_eq!(app.current_session().unwrap().messages.len(), 1);

        update(&mut app, Action::DeleteMessage { index: 0 });
        assert!(app.current_session().unwrap().messages.is_empty());
    }

    // ── Uploads ─────────────────────────────────────────────────────────

    #[test]
    fn test_upload_failure_keeps_earlier_urls_pending() {
        let mut app = test_app();
        update(
            &mut app,
            Action::UploadRequested(vec!["a.png".into(), "b.png".into(), "c.png".into()]),
        );
        assert!(app.uploading);

        // First two succeed, third fails; the batch task stops there.
        update(&mut app, Action::AttachmentUploaded("/files/a.png".to_string()));
        update(&mut app, Action::AttachmentUploaded("/files/b.png".to_string()));
        update(&mut app, Action::UploadFailed("upload failed: c.png".to_string()));

        assert!(!app.uploading);
        assert_eq!(app.pending_attachments.len(), 2);
        assert!(app.error.is_some());
    }

    #[test]
    fn test_upload_request_while_uploading_is_noop() {
        let mut app = test_app();
        app.uploading = true;
        let effect = update(&mut app, Action::UploadRequested(vec!["a.png".into()]));
        assert_eq!(effect, Effect::None);
    }

    // ── Errors ──────────────────────────────────────────────────────────

    #[test]
    fn test_dismiss_error() {
        let mut app = test_app();
        update(&mut app, Action::RequestFailed("boom".to_string()));
        assert!(app.error.is_some());
        update(&mut app, Action::DismissError);
        assert!(app.error.is_none());
    }
}
