//! Database models.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Unique, case-sensitive login name.
    pub username: String,
    /// Hex-encoded SHA-256 digest of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Timestamp of the last successful login, if any.
    pub last_login: Option<String>,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The value stored in the `role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// "user" or "assistant" by convention.
    pub role: String,
    /// Message body.
    pub message: String,
    /// Insertion timestamp.
    pub timestamp: String,
}

/// The saved session snapshot for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserState {
    /// Owning user.
    pub user_id: i64,
    /// Last time the snapshot was written.
    pub last_activity: String,
    /// Opaque serialized session data.
    pub session_data: Option<String>,
}
