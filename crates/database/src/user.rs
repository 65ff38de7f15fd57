//! Credential store: registration, verification and lookups.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DatabaseError, Result};
use crate::models::User;
use crate::validation::{validate_password, validate_username};

/// Hash a password into a lowercase hex SHA-256 digest.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    hex::encode(digest)
}

/// Register a new user, returning its ID.
///
/// Fails with [`DatabaseError::AlreadyExists`] when the username is taken.
pub async fn register_user(pool: &SqlitePool, username: &str, password: &str) -> Result<i64> {
    validate_username(username)?;
    validate_password(password)?;

    let password_hash = hash_password(password);

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES (?, ?)
        "#,
    )
    .bind(username)
    .bind(&password_hash)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: username.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    let id = result.last_insert_rowid();
    debug!(user_id = id, "Registered user");

    Ok(id)
}

/// Verify a username/password pair.
///
/// Returns the user's ID on a match and `None` for an unknown user or a
/// wrong password. A successful match also stamps `last_login`; failing to
/// do so is logged and does not fail the verification.
pub async fn verify_user(pool: &SqlitePool, username: &str, password: &str) -> Result<Option<i64>> {
    let record = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT id, password_hash
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some((id, stored_hash)) = record else {
        return Ok(None);
    };

    if stored_hash != hash_password(password) {
        return Ok(None);
    }

    if let Err(err) = touch_last_login(pool, id).await {
        warn!(user_id = id, error = %err, "Could not update last_login");
    }

    Ok(Some(id))
}

/// Set `last_login` to the current time.
pub async fn touch_last_login(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET last_login = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, created_at, last_login
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get a user by username.
pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, created_at, last_login
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: username.to_string(),
    })
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
