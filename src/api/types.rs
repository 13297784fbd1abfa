//! Wire types for the chat server's JSON API.
//!
//! Field names and shapes are fixed by the backend. The server owns all
//! identity and timestamp fields; the client never generates ids. Timestamps
//! travel as ISO-8601 strings and are only parsed for display.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Client-side delivery state of a message. Never serialized: everything the
/// server returns is authoritative and therefore `Sent`; only optimistic
/// local appends pass through `Pending` (and `Failed` if the send errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    #[default]
    Sent,
    Pending,
    Failed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_urls: Option<Vec<String>>,
    #[serde(skip, default)]
    pub delivery: Delivery,
}

impl Message {
    /// Build an optimistic local user message, timestamped now.
    pub fn pending_user(content: String, file_urls: Vec<String>) -> Self {
        Message {
            role: Role::User,
            content,
            timestamp: chrono::Local::now().to_rfc3339(),
            file_urls: if file_urls.is_empty() {
                None
            } else {
                Some(file_urls)
            },
            delivery: Delivery::Pending,
        }
    }
}

/// A conversation thread with its own provider/model configuration.
/// The client holds a cached copy, replaced wholesale on each mutating call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_provider: String,
}

/// Partial update for `PUT /sessions/{id}`. Absent fields are left untouched
/// by the server, so everything is optional and skipped when `None`.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_provider: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_urls: Option<Vec<String>>,
}

/// `POST /chat` returns the authoritative session (now containing the user
/// message and the assistant reply) plus the reply on its own.
#[derive(Deserialize, Debug, Clone)]
pub struct ChatReply {
    pub session: Session,
    pub response: Message,
}

/// Provider/model catalog from `GET /config`. Read-only for the client.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub models: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub default_provider: String,
    #[serde(default)]
    pub default_model: Option<String>,
}

impl ServerConfig {
    /// Ordered model list for a provider, empty if unknown.
    pub fn models_for(&self, provider: &str) -> &[String] {
        self.models.get(provider).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UploadResponse {
    pub file_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_deserializes_backend_shape() {
        let json = r#"{
            "id": "abc",
            "title": "First chat",
            "messages": [
                {"role": "user", "content": "hi", "timestamp": "2024-01-01T00:00:00"},
                {"role": "assistant", "content": "hello", "timestamp": "2024-01-01T00:00:01",
                 "file_urls": null}
            ],
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:01",
            "model": "gpt-4o",
            "api_provider": "openai"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "abc");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[1].role, Role::Assistant);
        // Server-returned messages are always Sent
        assert_eq!(session.messages[0].delivery, Delivery::Sent);
    }

    #[test]
    fn test_session_tolerates_missing_model_fields() {
        let json = r#"{
            "id": "abc",
            "title": "t",
            "messages": [],
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:00"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.model.is_empty());
        assert!(session.api_provider.is_empty());
    }

    #[test]
    fn test_session_update_skips_absent_fields() {
        let update = SessionUpdate {
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"model":"gpt-4o"}"#);
    }

    #[test]
    fn test_pending_user_message() {
        let msg = Message::pending_user("hello".to_string(), vec![]);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.delivery, Delivery::Pending);
        assert!(msg.file_urls.is_none());

        let with_files =
            Message::pending_user("see".to_string(), vec!["/files/a.png".to_string()]);
        assert_eq!(
            with_files.file_urls.as_deref(),
            Some(&["/files/a.png".to_string()][..])
        );
    }

    #[test]
    fn test_delivery_never_serializes() {
        let mut msg = Message::pending_user("x".to_string(), vec![]);
        msg.delivery = Delivery::Failed;
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("delivery"));
        assert!(!json.contains("Failed"));
    }

    #[test]
    fn test_server_config_models_for() {
        let json = r#"{
            "providers": ["openai", "deepseek"],
            "models": {"openai": ["gpt-4o", "gpt-4o-mini"], "deepseek": ["deepseek-chat"]},
            "default_provider": "openai",
            "default_model": "gpt-4o"
        }"#;
        let config: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.models_for("openai"), ["gpt-4o", "gpt-4o-mini"]);
        assert!(config.models_for("unknown").is_empty());
    }
}
