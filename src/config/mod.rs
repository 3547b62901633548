//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Relay configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Allowed client origins for CORS (comma-separated); None allows any
    pub client_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: optional_var("LOG_FORMAT").as_deref() == Some("json"),

            client_origin: optional_var("CLIENT_ORIGIN"),
        })
    }
}

/// Peer configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// WebSocket URL of the relay
    pub relay_url: String,
    pub player_name: String,
    /// Room to join; None hosts a new room
    pub room_code: Option<String>,
    /// Password to lock a hosted room or to unlock a joined one
    pub room_password: Option<String>,
    /// Match duration announced when hosting
    pub match_duration_secs: Option<u32>,
    pub log_level: String,
}

impl PeerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source; `get` returns the raw value of a key
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Unset and blank variables both read as None
        let optional = |key: &str| {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let relay_url =
            optional("RELAY_URL").unwrap_or_else(|| "ws://127.0.0.1:3000/ws".to_string());
        if !relay_url.starts_with("ws://") && !relay_url.starts_with("wss://") {
            return Err(ConfigError::InvalidRelayUrl(relay_url));
        }

        let match_duration_secs = match optional("MATCH_DURATION") {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::InvalidNumber("MATCH_DURATION"))?,
            ),
            None => None,
        };

        let room_code = optional("ROOM_CODE");
        let default_name = if room_code.is_none() { "Host" } else { "Player" };

        Ok(Self {
            relay_url,
            player_name: optional("PLAYER_NAME").unwrap_or_else(|| default_name.to_string()),
            room_code,
            room_password: optional("ROOM_PASSWORD"),
            match_duration_secs,
            log_level: optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Unset and blank variables both read as None
fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Relay URL must use ws:// or wss://, got {0}")]
    InvalidRelayUrl(String),

    #[error("Environment variable {0} must be a whole number")]
    InvalidNumber(&'static str),
}
