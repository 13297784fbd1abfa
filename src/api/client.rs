//! HTTP client for the chat server.
//!
//! [`ChatServer`] is the seam between the app and the network: the event loop
//! holds an `Arc<dyn ChatServer>` and test code substitutes a stub. The real
//! implementation, [`HttpChatServer`], is a thin reqwest wrapper: no retries,
//! no caching, no timeouts beyond reqwest's defaults. Callers handle
//! failures.

use std::fmt;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::auth::AuthScheme;
use super::types::{
    ChatReply, ChatRequest, ServerConfig, Session, SessionUpdate, UploadResponse,
};

/// Errors from talking to the chat server.
#[derive(Debug)]
pub enum ApiError {
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Non-2xx HTTP response.
    Api { status: u16, message: String },
    /// 2xx response whose JSON body carries an application `error` field.
    Backend(String),
    /// Failed to parse the server's response.
    Parse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Api { status, message } => {
                write!(f, "server error (HTTP {status}): {message}")
            }
            ApiError::Backend(msg) => write!(f, "{msg}"),
            ApiError::Parse(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Everything the backend exposes to the client. One method per endpoint.
#[async_trait]
pub trait ChatServer: Send + Sync {
    /// `GET /` with credentials attached. Used as the login probe.
    async fn probe(&self) -> Result<(), ApiError>;

    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError>;

    async fn create_session(&self, title: &str) -> Result<Session, ApiError>;

    async fn update_session(
        &self,
        id: &str,
        update: &SessionUpdate,
    ) -> Result<Session, ApiError>;

    async fn delete_session(&self, id: &str) -> Result<(), ApiError>;

    /// Delete all messages in a session. Returns the emptied session.
    async fn clear_messages(&self, id: &str) -> Result<Session, ApiError>;

    async fn fetch_config(&self) -> Result<ServerConfig, ApiError>;

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;

    /// Multipart upload of one file. Returns the server-assigned URL.
    async fn upload_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ApiError>;
}

/// Shape of the backend's application-level error payload. The server reports
/// some failures as `{"error": "..."}` inside a 200 response.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// reqwest-backed [`ChatServer`].
pub struct HttpChatServer {
    base_url: String,
    client: reqwest::Client,
    auth: Box<dyn AuthScheme>,
}

impl HttpChatServer {
    pub fn new(base_url: impl Into<String>, auth: Box<dyn AuthScheme>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.auth.attach(self.client.get(self.url(path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.auth.attach(self.client.post(self.url(path)))
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.auth.attach(self.client.put(self.url(path)))
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.auth.attach(self.client.delete(self.url(path)))
    }
}

/// Decode a response, translating HTTP errors and backend `{error}` payloads.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!("Request failed: HTTP {} - {}", status.as_u16(), body);
        return Err(ApiError::Api {
            status: status.as_u16(),
            message: http_error_message(&body),
        });
    }

    // Backend errors come back as 200 + {"error": "..."}
    if let Ok(err) = serde_json::from_str::<ErrorBody>(&body) {
        warn!("Backend-reported error: {}", err.error);
        return Err(ApiError::Backend(err.error));
    }

    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Pull a FastAPI-style `{"detail": "..."}` out of an error body if present,
/// otherwise return the raw body.
fn http_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Detail {
        detail: String,
    }
    match serde_json::from_str::<Detail>(body) {
        Ok(d) => d.detail,
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl ChatServer for HttpChatServer {
    async fn probe(&self) -> Result<(), ApiError> {
        let response = self.get("/").send().await?;
        let status = response.status();
        debug!("Probe response: HTTP {}", status.as_u16());
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Api {
                status: status.as_u16(),
                message: http_error_message(&body),
            })
        }
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        let response = self.get("/sessions").send().await?;
        read_json(response).await
    }

    async fn create_session(&self, title: &str) -> Result<Session, ApiError> {
        let response = self
            .post("/sessions")
            .query(&[("title", title)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_session(
        &self,
        id: &str,
        update: &SessionUpdate,
    ) -> Result<Session, ApiError> {
        let response = self
            .put(&format!("/sessions/{id}"))
            .json(update)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_session(&self, id: &str) -> Result<(), ApiError> {
        let response = self.delete(&format!("/sessions/{id}")).send().await?;
        // Body is `{"message": ...}` on success, `{"error": ...}` otherwise
        let _: serde_json::Value = read_json(response).await?;
        Ok(())
    }

    async fn clear_messages(&self, id: &str) -> Result<Session, ApiError> {
        let response = self
            .delete(&format!("/sessions/{id}/messages"))
            .send()
            .await?;
        read_json(response).await
    }

    async fn fetch_config(&self) -> Result<ServerConfig, ApiError> {
        let response = self.get("/config").send().await?;
        read_json(response).await
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        debug!(
            "Sending chat message ({} chars) to session {}",
            request.message.len(),
            request.session_id
        );
        let response = self.post("/chat").json(request).send().await?;
        read_json(response).await
    }

    async fn upload_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        debug!("Uploading {} ({} bytes)", filename, bytes.len());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self.post("/upload").multipart(form).send().await?;
        read_json(response).await
    }
}
