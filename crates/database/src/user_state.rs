//! Per-user session snapshot storage.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::UserState;

/// Create or replace the session snapshot for a user.
///
/// Exactly one row exists for the user afterwards; `last_activity` is reset
/// to the current time either way.
pub async fn save_user_state(pool: &SqlitePool, user_id: i64, session_data: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_state (user_id, last_activity, session_data)
        VALUES (?, CURRENT_TIMESTAMP, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            last_activity = CURRENT_TIMESTAMP,
            session_data = excluded.session_data
        "#,
    )
    .bind(user_id)
    .bind(session_data)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_foreign_key_violation() {
                return DatabaseError::NotFound {
                    entity: "User",
                    id: user_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Load the stored session blob for a user, if any.
pub async fn load_session_data(pool: &SqlitePool, user_id: i64) -> Result<Option<String>> {
    let state = get_user_state(pool, user_id).await?;
    Ok(state.and_then(|s| s.session_data))
}

/// Get the full snapshot row for a user.
pub async fn get_user_state(pool: &SqlitePool, user_id: i64) -> Result<Option<UserState>> {
    let record = sqlx::query_as::<_, UserState>(
        r#"
        SELECT user_id, last_activity, session_data
        FROM user_state
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}
