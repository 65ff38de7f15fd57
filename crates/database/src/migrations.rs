//! Ordered, idempotent schema migrations.
//!
//! Every step inspects the live schema before acting, so the whole list can
//! be replayed on each startup against a fresh file, a current one, or a
//! database created by older releases.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DatabaseError, Result};

/// A single schema change.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Create a table when no table of that name exists.
    CreateTable {
        table: &'static str,
        sql: &'static str,
    },
    /// Create an index when no index of that name exists.
    CreateIndex {
        index: &'static str,
        sql: &'static str,
    },
    /// Add a column when the table lacks it.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
    /// Rename a column when the old name is present and the new one is not.
    RenameColumn {
        table: &'static str,
        from: &'static str,
        to: &'static str,
    },
}

/// A named migration step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub step: Step,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "create_users",
        step: Step::CreateTable {
            table: "users",
            sql: r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                last_login TIMESTAMP DEFAULT NULL
            )
            "#,
        },
    },
    Migration {
        name: "rename_users_password",
        step: Step::RenameColumn {
            table: "users",
            from: "password",
            to: "password_hash",
        },
    },
    Migration {
        name: "add_users_last_login",
        step: Step::AddColumn {
            table: "users",
            column: "last_login",
            definition: "TIMESTAMP DEFAULT NULL",
        },
    },
    Migration {
        name: "create_chat_history",
        step: Step::CreateTable {
            table: "chat_history",
            sql: r#"
            CREATE TABLE chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                role TEXT NOT NULL,
                message TEXT NOT NULL,
                timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (id)
            )
            "#,
        },
    },
    Migration {
        name: "create_user_state",
        step: Step::CreateTable {
            table: "user_state",
            sql: r#"
            CREATE TABLE user_state (
                user_id INTEGER PRIMARY KEY,
                last_activity TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                session_data TEXT,
                FOREIGN KEY (user_id) REFERENCES users (id)
            )
            "#,
        },
    },
    Migration {
        name: "index_chat_history_user_timestamp",
        step: Step::CreateIndex {
            index: "idx_chat_history_user_timestamp",
            sql: r#"
            CREATE INDEX idx_chat_history_user_timestamp
            ON chat_history (user_id, timestamp)
            "#,
        },
    },
];

/// Apply every step in [`MIGRATIONS`], returning how many changed the schema.
pub async fn run(pool: &SqlitePool) -> Result<usize> {
    let mut applied = 0;

    for migration in MIGRATIONS {
        let changed = apply(pool, &migration.step)
            .await
            .map_err(|source| DatabaseError::Migration {
                step: migration.name,
                source,
            })?;

        if changed {
            info!(step = migration.name, "Applied migration");
            applied += 1;
        } else {
            debug!(step = migration.name, "Migration already satisfied");
        }
    }

    Ok(applied)
}

async fn apply(pool: &SqlitePool, step: &Step) -> std::result::Result<bool, sqlx::Error> {
    match *step {
        Step::CreateTable { table, sql } => {
            if object_exists(pool, "table", table).await? {
                return Ok(false);
            }
            sqlx::query(sql).execute(pool).await?;
        }
        Step::CreateIndex { index, sql } => {
            if object_exists(pool, "index", index).await? {
                return Ok(false);
            }
            sqlx::query(sql).execute(pool).await?;
        }
        Step::AddColumn {
            table,
            column,
            definition,
        } => {
            if column_exists(pool, table, column).await? {
                return Ok(false);
            }
            let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition);
            sqlx::query(&sql).execute(pool).await?;
        }
        Step::RenameColumn { table, from, to } => {
            if !column_exists(pool, table, from).await? || column_exists(pool, table, to).await? {
                return Ok(false);
            }
            let sql = format!("ALTER TABLE {} RENAME COLUMN {} TO {}", table, from, to);
            sqlx::query(&sql).execute(pool).await?;
        }
    }

    Ok(true)
}

async fn object_exists(
    pool: &SqlitePool,
    kind: &str,
    name: &str,
) -> std::result::Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM sqlite_master
        WHERE type = ? AND name = ?
        "#,
    )
    .bind(kind)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Check whether `table` currently has a column named `column`.
///
/// A missing table has no columns.
pub async fn column_exists(
    pool: &SqlitePool,
    table: &str,
    column: &str,
) -> std::result::Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM pragma_table_info(?)
        WHERE name = ?
        "#,
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}
