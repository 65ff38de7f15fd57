//! Append-only chat history log.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{ChatMessage, Role};

/// Append a message to a user's history, returning the new row ID.
///
/// Fails with [`DatabaseError::NotFound`] when the user does not exist.
pub async fn save_chat_message(
    pool: &SqlitePool,
    user_id: i64,
    role: Role,
    message: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO chat_history (user_id, role, message)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(role.as_str())
    .bind(message)
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

    Ok(result.last_insert_rowid())
}

/// Get a user's full history, oldest first.
///
/// Rows sharing a timestamp come back in insertion order.
pub async fn get_chat_history(pool: &SqlitePool, user_id: i64) -> Result<Vec<ChatMessage>> {
    let rows = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, user_id, role, message, timestamp
        FROM chat_history
        WHERE user_id = ?
        ORDER BY timestamp ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count the messages stored for a user.
pub async fn count_messages(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM chat_history
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
