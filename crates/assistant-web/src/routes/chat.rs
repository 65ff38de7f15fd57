//! Chat and history routes.

use askama::Template;
use axum::extract::State;
use axum::response::Redirect;
use axum::Form;
use database::{chat_history, user_state, ChatMessage, Role};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::session::{encode_conversation, ChatTurn, CurrentUser};
use crate::state::AppState;

/// Canned prompts offered beside the chat.
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "Write a program to sort an array using bubble sort",
    "Create a linked list implementation",
    "Program to check if a string is palindrome",
    "Write a program to find factorial of a number",
    "Create a program for matrix multiplication",
];

/// Chat page template.
#[derive(Template)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub username: String,
    pub messages: Vec<ChatTurn>,
    pub examples: Vec<&'static str>,
}

/// History page template.
#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub username: String,
    pub entries: Vec<ChatMessage>,
}

/// Submitted prompt form.
#[derive(Deserialize)]
pub struct PromptForm {
    pub prompt: String,
}

/// Render the chat page.
pub async fn chat_page(current: CurrentUser) -> ChatTemplate {
    ChatTemplate {
        username: current.chat.username,
        messages: current.chat.messages,
        examples: EXAMPLE_PROMPTS.to_vec(),
    }
}

/// Record a prompt, generate the answer and record it too.
///
/// Failed writes are logged and the conversation carries on.
pub async fn send_prompt(
    State(state): State<AppState>,
    mut current: CurrentUser,
    Form(form): Form<PromptForm>,
) -> Redirect {
    let prompt = form.prompt.trim();
    if prompt.is_empty() {
        return Redirect::to("/chat");
    }

    let user_id = current.chat.user_id;
    let pool = state.db.pool();

    if let Err(err) = chat_history::save_chat_message(pool, user_id, Role::User, prompt).await {
        warn!(user_id, error = %err, "Could not save prompt");
    }

    debug!(user_id, generator = state.coder.name(), "Generating code");
    let reply = state.coder.respond(prompt).await;

    if let Err(err) = chat_history::save_chat_message(pool, user_id, Role::Assistant, &reply).await
    {
        warn!(user_id, error = %err, "Could not save reply");
    }

    if let Err(err) = current.push_exchange(prompt, &reply).await {
        warn!(user_id, error = %err, "Could not update session");
    }
    save_conversation(&state, user_id, &current.chat.messages).await;

    Redirect::to("/chat")
}

/// Empty the on-screen conversation. Stored history is untouched.
pub async fn clear_chat(State(state): State<AppState>, mut current: CurrentUser) -> Redirect {
    let user_id = current.chat.user_id;
    if let Err(err) = current.clear_messages().await {
        warn!(user_id, error = %err, "Could not update session");
    }
    save_conversation(&state, user_id, &[]).await;

    Redirect::to("/chat")
}

/// Snapshot the on-screen conversation to `user_state`.
async fn save_conversation(state: &AppState, user_id: i64, messages: &[ChatTurn]) {
    let blob = match encode_conversation(messages) {
        Ok(blob) => blob,
        Err(err) => {
            warn!(user_id, error = %err, "Could not encode conversation");
            return;
        }
    };

    if let Err(err) = user_state::save_user_state(state.db.pool(), user_id, &blob).await {
        warn!(user_id, error = %err, "Could not save conversation");
    }
}

/// Render every stored message for the user, oldest first.
pub async fn history_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<HistoryTemplate> {
    let entries = chat_history::get_chat_history(state.db.pool(), current.chat.user_id).await?;

    Ok(HistoryTemplate {
        username: current.chat.username,
        entries,
    })
}
