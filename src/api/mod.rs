pub mod auth;
pub mod client;
pub mod types;

pub use auth::{AuthScheme, BasicAuth, Credentials, NoAuth};
pub use client::{ApiError, ChatServer, HttpChatServer};
pub use types::{
    ChatReply, ChatRequest, Delivery, Message, Role, ServerConfig, Session, SessionUpdate,
    UploadResponse,
};
