//! SQLite persistence layer for the C programming assistant.
//!
//! This crate owns the three tables behind the assistant: registered users,
//! the append-only chat history, and one saved session snapshot per user.
//!
//! # Example
//!
//! ```no_run
//! use database::{chat_history, user, user_state, Database, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and bring the schema up to date
//!     let db = Database::connect("sqlite:chat_app.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let id = user::register_user(db.pool(), "alice", "pw1").await?;
//!     chat_history::save_chat_message(db.pool(), id, Role::User, "Reverse a string").await?;
//!     user_state::save_user_state(db.pool(), id, "[]").await?;
//!
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod chat_history;
pub mod error;
pub mod migrations;
pub mod models;
pub mod user;
pub mod user_state;
pub mod validation;

pub use error::{DatabaseError, ErrorKind, Result};
pub use models::{ChatMessage, Role, User, UserState};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
///
/// Holds exactly one SQLite connection for the life of the process. Clones
/// share that connection.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// All statements go through a single connection.
    const MAX_CONNECTIONS: u32 = 1;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:chat_app.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // The connection is never idled out or recycled, so an in-memory
        // database lives as long as the handle.
        let pool = SqlitePoolOptions::new()
            .max_connections(Self::MAX_CONNECTIONS)
            .min_connections(Self::MAX_CONNECTIONS)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {}", url);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// Safe to call on every startup; see [`migrations::MIGRATIONS`].
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        let applied = migrations::run(&self.pool).await?;

        tracing::info!(applied, "Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the underlying connection.
    ///
    /// Further operations on this handle or its clones fail with a storage
    /// error.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection closed");
    }
}
