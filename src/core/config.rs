//! # Configuration
//!
//! Centralizes all client settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.easychat/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EasychatConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub chat: ChatSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerSection {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AuthSection {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatSection {
    pub default_session_title: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_SESSION_TITLE: &str = "New chat";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    /// Prefilled login username, if any. The login screen still runs.
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_session_title: String,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.easychat/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".easychat").join("config.toml"))
}

/// Load config from `~/.easychat/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and returns
/// `EasychatConfig::default()`. If it exists but is malformed, returns
/// `ConfigError::Parse`.
pub fn load_config() -> Result<EasychatConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(EasychatConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(EasychatConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: EasychatConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# easychat configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# base_url = "http://localhost:8000"   # Or set EASYCHAT_BASE_URL

# [auth]
# username = "alice"                   # Or set EASYCHAT_USERNAME
# password = "secret"                  # Or set EASYCHAT_PASSWORD
# Leaving these out prompts the login screen on startup.

# [chat]
# default_session_title = "New chat"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars
/// → CLI flags. `cli_server` and `cli_username` come from clap (None = not
/// specified).
pub fn resolve(
    config: &EasychatConfig,
    cli_server: Option<&str>,
    cli_username: Option<&str>,
) -> ResolvedConfig {
    let base_url = cli_server
        .map(|s| s.to_string())
        .or_else(|| std::env::var("EASYCHAT_BASE_URL").ok())
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let username = cli_username
        .map(|s| s.to_string())
        .or_else(|| std::env::var("EASYCHAT_USERNAME").ok())
        .or_else(|| config.auth.username.clone());

    let password = std::env::var("EASYCHAT_PASSWORD")
        .ok()
        .or_else(|| config.auth.password.clone());

    let default_session_title = config
        .chat
        .default_session_title
        .clone()
        .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string());

    ResolvedConfig {
        base_url,
        username,
        password,
        default_session_title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let config = EasychatConfig::default();
        let resolved = resolve(&config, None, None);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert!(resolved.username.is_none());
        assert_eq!(resolved.default_session_title, DEFAULT_SESSION_TITLE);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = EasychatConfig {
            server: ServerSection {
                base_url: Some("https://chat.example.com".to_string()),
            },
            auth: AuthSection {
                username: Some("alice".to_string()),
                password: Some("secret".to_string()),
            },
            chat: ChatSection {
                default_session_title: Some("Untitled".to_string()),
            },
        };
        let resolved = resolve(&config, None, None);
        assert_eq!(resolved.base_url, "https://chat.example.com");
        assert_eq!(resolved.username.as_deref(), Some("alice"));
        assert_eq!(resolved.password.as_deref(), Some("secret"));
        assert_eq!(resolved.default_session_title, "Untitled");
    }

    #[test]
    fn test_resolve_cli_wins() {
        let config = EasychatConfig {
            server: ServerSection {
                base_url: Some("https://chat.example.com".to_string()),
            },
            auth: AuthSection {
                username: Some("alice".to_string()),
                password: None,
            },
            ..Default::default()
        };
        let resolved = resolve(&config, Some("http://10.0.0.2:8000"), Some("bob"));
        assert_eq!(resolved.base_url, "http://10.0.0.2:8000");
        assert_eq!(resolved.username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let toml_str = r#"
[server]
base_url = "http://192.168.1.10:8000"
"#;
        let config: EasychatConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.server.base_url.as_deref(),
            Some("http://192.168.1.10:8000")
        );
        assert!(config.auth.username.is_none());
        assert!(config.chat.default_session_title.is_none());
    }

    #[test]
    fn test_full_toml_round_trip() {
        let toml_str = r#"
[server]
base_url = "https://chat.example.com"

[auth]
username = "alice"
password = "secret"

[chat]
default_session_title = "Scratch"
"#;
        let config: EasychatConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.auth.username.as_deref(), Some("alice"));
        assert_eq!(config.chat.default_session_title.as_deref(), Some("Scratch"));
    }
}
