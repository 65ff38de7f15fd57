//! Login, signup and logout routes.

use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use database::{user, user_state, DatabaseError};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::Result;
use crate::session::{decode_conversation, start_session, ChatSession, ChatTurn, CurrentUser};
use crate::state::AppState;

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Signup page template.
#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub username: String,
    pub error: Option<String>,
}

/// Query parameters accepted by the login page.
#[derive(Deserialize)]
pub struct LoginQuery {
    pub registered: Option<bool>,
}

/// Submitted login form.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Submitted signup form.
#[derive(Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Render the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> LoginTemplate {
    let notice = query
        .registered
        .unwrap_or(false)
        .then(|| "Account created successfully! Please login.".to_string());

    LoginTemplate {
        username: String::new(),
        error: None,
        notice,
    }
}

/// Check credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if form.username.is_empty() || form.password.is_empty() {
        return Ok(login_failed(form.username, "Please enter your username and password"));
    }

    let Some(user_id) = user::verify_user(state.db.pool(), &form.username, &form.password).await?
    else {
        info!("Rejected login attempt");
        return Ok(login_failed(form.username, "Invalid username or password"));
    };

    let messages = restore_conversation(&state, user_id).await;
    let restored = messages.len();
    let chat = ChatSession {
        user_id,
        username: form.username,
        messages,
    };
    start_session(&session, chat).await?;

    info!(user_id, restored, "User logged in");

    Ok(Redirect::to("/chat").into_response())
}

fn login_failed(username: String, error: &str) -> Response {
    let page = LoginTemplate {
        username,
        error: Some(error.to_string()),
        notice: None,
    };
    (StatusCode::UNAUTHORIZED, page).into_response()
}

/// Reload the conversation saved at the end of the user's last session.
///
/// An unreadable or missing snapshot starts an empty conversation.
async fn restore_conversation(state: &AppState, user_id: i64) -> Vec<ChatTurn> {
    let blob = match user_state::load_session_data(state.db.pool(), user_id).await {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(user_id, error = %err, "Could not load saved conversation");
            return Vec::new();
        }
    };

    decode_conversation(&blob).unwrap_or_else(|err| {
        warn!(user_id, error = %err, "Discarding unreadable saved conversation");
        Vec::new()
    })
}

/// Render the signup page.
pub async fn signup_page() -> SignupTemplate {
    SignupTemplate {
        username: String::new(),
        error: None,
    }
}

/// Register a new account.
pub async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Result<Response> {
    if form.username.is_empty() || form.password.is_empty() {
        return Ok(signup_failed(form.username, "Please fill in all fields".to_string()));
    }

    if form.password != form.confirm_password {
        return Ok(signup_failed(form.username, "Passwords do not match".to_string()));
    }

    match user::register_user(state.db.pool(), &form.username, &form.password).await {
        Ok(user_id) => {
            info!(user_id, "Account created");
            Ok(Redirect::to("/login?registered=true").into_response())
        }
        Err(DatabaseError::AlreadyExists { .. }) => Ok(signup_failed(
            form.username,
            "Username already exists. Please choose another.".to_string(),
        )),
        Err(DatabaseError::Validation(err)) => Ok(signup_failed(form.username, capitalize(&err.to_string()))),
        Err(err) => Err(err.into()),
    }
}

fn signup_failed(username: String, error: String) -> Response {
    let page = SignupTemplate {
        username,
        error: Some(error),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// End the current session.
pub async fn logout(current: CurrentUser) -> Result<Redirect> {
    let user_id = current.chat.user_id;
    current.end().await?;
    info!(user_id, "User logged out");

    Ok(Redirect::to("/login"))
}
