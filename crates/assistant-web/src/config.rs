//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Stylesheet directory shipped with the crate.
const DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Web server configuration.
///
/// Code generation settings are read separately by
/// [`gemini_coder::GeminiConfig::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
    /// Minutes a session may sit unused before it expires.
    pub session_idle_minutes: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ASSISTANT_ADDR` | Server bind address | `127.0.0.1:8501` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:chat_app.db?mode=rwc` |
    /// | `STATIC_DIR` | Stylesheet directory | the crate's `static/` |
    /// | `SESSION_IDLE_MINUTES` | Session inactivity timeout | `60` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("ASSISTANT_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8501".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:chat_app.db?mode=rwc".to_string());

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR));

        let session_idle_minutes = match env::var("SESSION_IDLE_MINUTES") {
            Ok(value) => value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or(ConfigError::InvalidSessionIdle)?,
            Err(_) => 60,
        };

        Ok(Self {
            addr,
            database_url,
            static_dir,
            session_idle_minutes,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid ASSISTANT_ADDR format")]
    InvalidAddr,

    #[error("SESSION_IDLE_MINUTES must be a positive number of minutes")]
    InvalidSessionIdle,
}
