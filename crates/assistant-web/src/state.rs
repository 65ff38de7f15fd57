//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use gemini_coder::CodeGenerator;
use tower_sessions::cookie::time::Duration;
use tower_sessions::MemoryStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Code generator answering prompts.
    pub coder: Arc<dyn CodeGenerator>,
    /// Logged-in browser sessions.
    pub sessions: MemoryStore,
    /// How long a session may sit unused.
    pub session_idle: Duration,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, coder: Arc<dyn CodeGenerator>, session_idle: Duration) -> Self {
        Self {
            db,
            coder,
            sessions: MemoryStore::default(),
            session_idle,
        }
    }
}
