//! Credential attachment.
//!
//! The server has no session tokens: every request re-sends full credentials
//! as an `Authorization: Basic` header. The attachment mechanism sits behind
//! the [`AuthScheme`] trait so the client code never hardcodes basic auth.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Username + password pair. Held in memory only, never persisted by the
/// client itself (the optional config file is the user's own choice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Attaches authentication to an outgoing request.
pub trait AuthScheme: Send + Sync {
    fn attach(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

/// HTTP Basic authentication: `Basic base64(username:password)`.
/// The header value is computed once at construction.
pub struct BasicAuth {
    header_value: String,
}

impl BasicAuth {
    pub fn new(credentials: &Credentials) -> Self {
        let raw = format!("{}:{}", credentials.username, credentials.password);
        Self {
            header_value: format!("Basic {}", STANDARD.encode(raw)),
        }
    }

    #[cfg(test)]
    pub fn header_value(&self) -> &str {
        &self.header_value
    }
}

impl AuthScheme for BasicAuth {
    fn attach(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, self.header_value.clone())
    }
}

/// No authentication. Useful against unsecured local servers and in tests.
pub struct NoAuth;

impl AuthScheme for NoAuth {
    fn attach(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
    }
}
