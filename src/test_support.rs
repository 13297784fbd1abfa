//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{
    ApiError, ChatReply, ChatRequest, ChatServer, Message, Role, ServerConfig, Session,
    SessionUpdate, UploadResponse,
};
use crate::core::state::App;

/// A server stub for tests that never touch the network.
pub struct NoopServer;

#[async_trait]
impl ChatServer for NoopServer {
    async fn probe(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        Ok(vec![])
    }

    async fn create_session(&self, title: &str) -> Result<Session, ApiError> {
        Ok(session("noop", title))
    }

    async fn update_session(
        &self,
        id: &str,
        _update: &SessionUpdate,
    ) -> Result<Session, ApiError> {
        Ok(session(id, "noop"))
    }

    async fn delete_session(&self, _id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn clear_messages(&self, id: &str) -> Result<Session, ApiError> {
        Ok(session(id, "noop"))
    }

    async fn fetch_config(&self) -> Result<ServerConfig, ApiError> {
        Ok(ServerConfig::default())
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        Err(ApiError::Backend(format!(
            "noop server cannot chat (session {})",
            request.session_id
        )))
    }

    async fn upload_file(
        &self,
        filename: &str,
        _bytes: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        Ok(UploadResponse {
            file_url: format!("/files/{filename}"),
        })
    }
}

/// Creates a test App backed by a NoopServer.
pub fn test_app() -> App {
    App::new(Arc::new(NoopServer), "New chat".to_string())
}

pub fn session(id: &str, title: &str) -> Session {
    Session {
        id: id.to_string(),
        title: title.to_string(),
        messages: vec![],
        created_at: "2024-01-01T00:00:00".to_string(),
        updated_at: "2024-01-01T00:00:00".to_string(),
        model: String::new(),
        api_provider: String::new(),
    }
}

pub fn user_message(content: &str) -> Message {
    Message {
        role: Role::User,
        content: content.to_string(),
        timestamp: "2024-01-01T00:00:00".to_string(),
        file_urls: None,
        delivery: Default::default(),
    }
}

pub fn assistant_message(content: &str) -> Message {
    Message {
        role: Role::Assistant,
        content: content.to_string(),
        timestamp: "2024-01-01T00:00:01".to_string(),
        file_urls: None,
        delivery: Default::default(),
    }
}

pub fn session_with_messages(id: &str, contents: &[&str]) -> Session {
    let mut s = session(id, "test");
    for (i, content) in contents.iter().enumerate() {
        s.messages.push(if i % 2 == 0 {
            user_message(content)
        } else {
            assistant_message(content)
        });
    }
    s
}

/// A `/chat` reply: the authoritative session holding `contents` (alternating
/// user/assistant), with the last message doubling as the response.
pub fn reply(session_id: &str, contents: &[&str]) -> ChatReply {
    let session = session_with_messages(session_id, contents);
    let response = session
        .messages
        .last()
        .cloned()
        .unwrap_or_else(|| assistant_message(""));
    ChatReply { session, response }
}
