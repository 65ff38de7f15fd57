//! Route handlers for the web interface.

pub mod auth;
pub mod chat;
pub mod health;

use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;

use crate::session::{self, CurrentUser};
use crate::state::AppState;

/// Build the router with all routes and the session layer.
pub fn router(state: AppState) -> Router {
    let sessions = session::layer(state.sessions.clone(), state.session_idle);

    Router::new()
        // HTML pages
        .route("/", get(index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/chat", get(chat::chat_page).post(chat::send_prompt))
        .route("/chat/clear", post(chat::clear_chat))
        .route("/history", get(chat::history_page))
        // Health check
        .route("/health", get(health::health))
        .layer(sessions)
        .with_state(state)
}

/// Send logged-in users to the chat and everyone else to the login page.
async fn index(current: Option<CurrentUser>) -> Redirect {
    match current {
        Some(_) => Redirect::to("/chat"),
        None => Redirect::to("/login"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use database::{chat_history, user_state, Database};
    use gemini_coder::{async_trait, CodeGenerator, CodegenError};
    use tower::ServiceExt;
    use tower_sessions::cookie::time::Duration;

    use super::*;
    use crate::session::decode_conversation;

    const REPLY: &str = "int main(void) { return 0; }";

    struct StubCoder;

    #[async_trait]
    impl CodeGenerator for StubCoder {
        async fn generate(&self, _prompt: &str) -> Result<String, CodegenError> {
            Ok(REPLY.to_string())
        }

        fn name(&self) -> &str {
            "StubCoder"
        }
    }

    struct FailingCoder;

    #[async_trait]
    impl CodeGenerator for FailingCoder {
        async fn generate(&self, _prompt: &str) -> Result<String, CodegenError> {
            Err(CodegenError::Status {
                status: 500,
                message: None,
            })
        }

        fn name(&self) -> &str {
            "FailingCoder"
        }
    }

    async fn test_state(coder: Arc<dyn CodeGenerator>) -> AppState {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        AppState::new(db, coder, Duration::hours(1))
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        router(state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    fn get_page(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    /// Register and log in, returning the `name=value` cookie pair.
    async fn sign_in(state: &AppState, username: &str, password: &str) -> String {
        let body = format!(
            "username={0}&password={1}&confirm_password={1}",
            username, password
        );
        let response = send(state, post_form("/signup", &body, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        log_in(state, username, password).await
    }

    async fn log_in(state: &AppState, username: &str, password: &str) -> String {
        let body = format!("username={}&password={}", username, password);
        let response = send(state, post_form("/login", &body, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/chat");

        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state(Arc::new(StubCoder)).await;

        let response = send(&state, get_page("/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_protected_pages_redirect_to_login() {
        let state = test_state(Arc::new(StubCoder)).await;

        for uri in ["/", "/chat", "/history"] {
            let response = send(&state, get_page(uri, None)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(location(&response), "/login");
        }

        let stale = send(&state, get_page("/chat", Some("assistant_session=missing"))).await;
        assert_eq!(location(&stale), "/login");

        let response = send(&state, post_form("/chat", "prompt=hello", None)).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_login_and_signup_pages_render() {
        let state = test_state(Arc::new(StubCoder)).await;

        let response = send(&state, get_page("/login", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("name=\"password\""));

        let response = send(&state, get_page("/login?registered=true", None)).await;
        assert!(body_text(response).await.contains("Account created successfully"));

        let response = send(&state, get_page("/signup", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("name=\"confirm_password\""));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let state = test_state(Arc::new(StubCoder)).await;

        let response = send(
            &state,
            post_form("/signup", "username=alice&password=&confirm_password=", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("Please fill in all fields"));

        let response = send(
            &state,
            post_form("/signup", "username=alice&password=pw1&confirm_password=pw2", None),
        )
        .await;
        assert!(body_text(response).await.contains("Passwords do not match"));

        let response = send(
            &state,
            post_form("/signup", "username=alice&password=pw1&confirm_password=pw1", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?registered=true");

        let response = send(
            &state,
            post_form("/signup", "username=alice&password=pw2&confirm_password=pw2", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("Username already exists"));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let state = test_state(Arc::new(StubCoder)).await;
        sign_in(&state, "alice", "pw1").await;

        let response = send(&state, post_form("/login", "username=alice&password=pw2", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(body_text(response).await.contains("Invalid username or password"));

        let response = send(&state, post_form("/login", "username=bob&password=pw1", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_chat_flow_persists_messages() {
        let state = test_state(Arc::new(StubCoder)).await;
        let cookie = sign_in(&state, "alice", "pw1").await;

        let response = send(&state, get_page("/", Some(&cookie))).await;
        assert_eq!(location(&response), "/chat");

        let response = send(
            &state,
            post_form("/chat", "prompt=Reverse+a+string+in+place", Some(&cookie)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/chat");

        let page = body_text(send(&state, get_page("/chat", Some(&cookie))).await).await;
        assert!(page.contains("Welcome, alice"));
        assert!(page.contains("Reverse a string in place"));
        assert!(page.contains(REPLY));

        let user_id = database::user::get_user_by_username(state.db.pool(), "alice")
            .await
            .unwrap()
            .id;
        let history = chat_history::get_chat_history(state.db.pool(), user_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].message, "Reverse a string in place");
        assert_eq!(history[1].role, "assistant");
        assert_eq!(history[1].message, REPLY);

        let blob = user_state::load_session_data(state.db.pool(), user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decode_conversation(&blob).unwrap().len(), 2);

        let page = body_text(send(&state, get_page("/history", Some(&cookie))).await).await;
        assert!(page.contains("Reverse a string in place"));
        assert!(page.contains(REPLY));
    }

    #[tokio::test]
    async fn test_blank_prompt_is_ignored() {
        let state = test_state(Arc::new(StubCoder)).await;
        let cookie = sign_in(&state, "alice", "pw1").await;

        let response = send(&state, post_form("/chat", "prompt=+++", Some(&cookie))).await;
        assert_eq!(location(&response), "/chat");

        let user_id = database::user::get_user_by_username(state.db.pool(), "alice")
            .await
            .unwrap()
            .id;
        assert_eq!(
            chat_history::count_messages(state.db.pool(), user_id).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_clear_keeps_stored_history() {
        let state = test_state(Arc::new(StubCoder)).await;
        let cookie = sign_in(&state, "alice", "pw1").await;

        send(&state, post_form("/chat", "prompt=factorial", Some(&cookie))).await;
        let response = send(&state, post_form("/chat/clear", "", Some(&cookie))).await;
        assert_eq!(location(&response), "/chat");

        let page = body_text(send(&state, get_page("/chat", Some(&cookie))).await).await;
        assert!(!page.contains(REPLY));

        let page = body_text(send(&state, get_page("/history", Some(&cookie))).await).await;
        assert!(page.contains(REPLY));
    }

    #[tokio::test]
    async fn test_conversation_survives_logout() {
        let state = test_state(Arc::new(StubCoder)).await;
        let cookie = sign_in(&state, "alice", "pw1").await;

        send(&state, post_form("/chat", "prompt=Count+vowels+in+a+word", Some(&cookie))).await;

        let response = send(&state, post_form("/logout", "", Some(&cookie))).await;
        assert_eq!(location(&response), "/login");
        assert!(response.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        let response = send(&state, get_page("/chat", Some(&cookie))).await;
        assert_eq!(location(&response), "/login");

        let cookie = log_in(&state, "alice", "pw1").await;
        let page = body_text(send(&state, get_page("/chat", Some(&cookie))).await).await;
        assert!(page.contains("Count vowels in a word"));
        assert!(page.contains(REPLY));
    }

    #[tokio::test]
    async fn test_generation_failure_is_stored_as_reply() {
        let state = test_state(Arc::new(FailingCoder)).await;
        let cookie = sign_in(&state, "alice", "pw1").await;

        let response = send(&state, post_form("/chat", "prompt=matrix", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let user_id = database::user::get_user_by_username(state.db.pool(), "alice")
            .await
            .unwrap()
            .id;
        let history = chat_history::get_chat_history(state.db.pool(), user_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[1].message,
            "Error: API request failed with status code 500"
        );
    }

    #[tokio::test]
    async fn test_session_cookie_attributes() {
        let state = test_state(Arc::new(StubCoder)).await;
        sign_in(&state, "alice", "pw1").await;

        let response = send(&state, post_form("/login", "username=alice&password=pw1", None)).await;
        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("assistant_session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Max-Age=") || set_cookie.contains("Expires="));
    }

    #[tokio::test]
    async fn test_login_again_replaces_the_session() {
        let state = test_state(Arc::new(StubCoder)).await;
        let first = sign_in(&state, "alice", "pw1").await;

        let response = send(
            &state,
            post_form("/login", "username=alice&password=pw1", Some(&first)),
        )
        .await;
        assert_eq!(location(&response), "/chat");
        let second = response.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        assert_ne!(first, second);

        let response = send(&state, get_page("/chat", Some(&first))).await;
        assert_eq!(location(&response), "/login");

        let response = send(&state, get_page("/chat", Some(&second))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let state = AppState::new(db, Arc::new(StubCoder), Duration::seconds(1));
        let cookie = sign_in(&state, "alice", "pw1").await;

        let response = send(&state, get_page("/chat", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

        let response = send(&state, get_page("/chat", Some(&cookie))).await;
        assert_eq!(location(&response), "/login");
    }
}
