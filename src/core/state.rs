//! # Application State
//!
//! Core client state for easychat. Domain logic only, no TUI-specific
//! types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── server: Arc<dyn ChatServer>      // authenticated API handle
//! ├── sessions: Vec<Session>           // cached session list
//! ├── current_session_id: Option       // active session (None = none)
//! ├── catalog: Option<ServerConfig>    // provider/model catalog
//! ├── is_loading: bool                 // a chat send is in flight
//! ├── uploading: bool                  // an upload batch is in flight
//! ├── pending_attachments: Vec<String> // uploaded file URLs awaiting send
//! ├── error: Option<String>            // one dismissible error banner
//! └── status_message: String           // status bar text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::api::{ChatServer, ServerConfig, Session};

pub struct App {
    pub server: Arc<dyn ChatServer>,
    pub sessions: Vec<Session>,
    pub current_session_id: Option<String>,
    pub catalog: Option<ServerConfig>,
    /// True while a `/chat` request is in flight. Submits are no-ops until
    /// the response (or failure) lands.
    pub is_loading: bool,
    /// True while an upload batch runs. Uploads are strictly sequential.
    pub uploading: bool,
    /// File URLs from completed uploads, attached to the next send.
    pub pending_attachments: Vec<String>,
    pub error: Option<String>,
    pub status_message: String,
    /// Title used when a new session is created with a blank title.
    pub default_session_title: String,
}

impl App {
    pub fn new(server: Arc<dyn ChatServer>, default_session_title: String) -> Self {
        Self {
            server,
            sessions: Vec::new(),
            current_session_id: None,
            catalog: None,
            is_loading: false,
            uploading: false,
            pending_attachments: Vec::new(),
            error: None,
            status_message: String::from("Connected"),
            default_session_title,
        }
    }

    pub fn current_session(&self) -> Option<&Session> {
        let id = self.current_session_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn current_session_mut(&mut self) -> Option<&mut Session> {
        let id = self.current_session_id.clone()?;
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Replace a cached session with the server's authoritative copy,
    /// keeping the list and (if matching) the active session in sync.
    pub fn reconcile_session(&mut self, session: Session) {
        match self.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(slot) => *slot = session,
            None => self.sessions.push(session),
        }
    }
}
