//! Browser sessions.
//!
//! Sessions are managed by `tower-sessions`: the cookie carries only a
//! session ID, while the logged-in user and the on-screen conversation live
//! in a [`MemoryStore`] record that expires after a period of inactivity.
//! The conversation is also snapshotted to `user_state` so it survives a
//! fresh login.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use database::Role;
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::session::Error as SessionError;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::error::WebError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "assistant_session";

/// Session key holding the [`ChatSession`].
const CHAT_KEY: &str = "chat";

/// One message in the on-screen conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Serialize a conversation into the opaque `user_state` blob.
pub fn encode_conversation(messages: &[ChatTurn]) -> serde_json::Result<String> {
    serde_json::to_string(messages)
}

/// Parse a `user_state` blob back into a conversation.
pub fn decode_conversation(blob: &str) -> serde_json::Result<Vec<ChatTurn>> {
    serde_json::from_str(blob)
}

/// What a logged-in session remembers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub user_id: i64,
    pub username: String,
    pub messages: Vec<ChatTurn>,
}

/// Session middleware backed by `store`.
///
/// Records expire after `idle` without a write.
pub fn layer(store: MemoryStore, idle: Duration) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(idle))
}

/// Log `chat.user_id` in under a fresh session ID.
///
/// Any record the browser already had is dropped from the store.
pub async fn start_session(session: &Session, chat: ChatSession) -> Result<(), SessionError> {
    session.cycle_id().await?;
    session.insert(CHAT_KEY, chat).await
}

/// Extractor for handlers that require a logged-in user.
///
/// Requests without a live session are redirected to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: Session,
    pub chat: ChatSession,
}

impl CurrentUser {
    /// Append a prompt and its reply to the on-screen conversation.
    pub async fn push_exchange(&mut self, prompt: &str, reply: &str) -> Result<(), SessionError> {
        self.chat.messages.push(ChatTurn::user(prompt));
        self.chat.messages.push(ChatTurn::assistant(reply));
        self.session.insert(CHAT_KEY, &self.chat).await
    }

    /// Empty the on-screen conversation.
    pub async fn clear_messages(&mut self) -> Result<(), SessionError> {
        self.chat.messages.clear();
        self.session.insert(CHAT_KEY, &self.chat).await
    }

    /// Delete the session record and expire the cookie.
    pub async fn end(self) -> Result<(), SessionError> {
        self.session.flush().await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let chat = session
            .get::<ChatSession>(CHAT_KEY)
            .await
            .map_err(|err| WebError::from(err).into_response())?;

        match chat {
            Some(chat) => Ok(Self { session, chat }),
            None => Err(Redirect::to("/login").into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_blob_round_trip() {
        let messages = vec![ChatTurn::user("bubble sort"), ChatTurn::assistant("void sort();")];

        let blob = encode_conversation(&messages).unwrap();
        assert_eq!(
            blob,
            r#"[{"role":"user","content":"bubble sort"},{"role":"assistant","content":"void sort();"}]"#
        );
        assert_eq!(decode_conversation(&blob).unwrap(), messages);
        assert!(decode_conversation("[{'role': 'user'}]").is_err());
    }

    #[test]
    fn test_turn_roles() {
        assert!(ChatTurn::user("factorial").is_user());
        assert!(!ChatTurn::assistant("int f(int n);").is_user());
    }

    #[tokio::test]
    async fn test_session_keeps_chat_state() {
        let session = Session::new(None, std::sync::Arc::new(MemoryStore::default()), None);
        let chat = ChatSession {
            user_id: 1,
            username: "alice".to_string(),
            messages: vec![ChatTurn::user("factorial")],
        };

        start_session(&session, chat.clone()).await.unwrap();
        assert_eq!(session.get::<ChatSession>(CHAT_KEY).await.unwrap(), Some(chat.clone()));

        let mut current = CurrentUser {
            session: session.clone(),
            chat,
        };
        current.push_exchange("palindrome", "int is_pal(const char *s);").await.unwrap();

        let stored = session.get::<ChatSession>(CHAT_KEY).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 3);
        assert!(!stored.messages[2].is_user());

        current.clear_messages().await.unwrap();
        let stored = session.get::<ChatSession>(CHAT_KEY).await.unwrap().unwrap();
        assert!(stored.messages.is_empty());

        current.end().await.unwrap();
        assert!(session.get::<ChatSession>(CHAT_KEY).await.unwrap().is_none());
    }
}
