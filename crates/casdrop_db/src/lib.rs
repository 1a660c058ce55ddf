//! Document store for casdrop.
//!
//! Two tables back the ingestion pipeline: file credentials (read by the
//! pipeline, written out-of-band) and parsed statements (insert-only).
//!
//! # Usage
//!
//! ```rust,ignore
//! use casdrop_db::{CasDropDb, TableNames};
//!
//! let db = CasDropDb::open("~/.casdrop/casdrop.sqlite3", TableNames::default()).await?;
//!
//! db.credential_put("CAS-01.pdf", "secret", None).await?;
//! let cred = db.credential_find("CAS-01.pdf").await?;
//!
//! let id = db.result_insert("CAS-01.pdf", &serde_json::json!({"folios": []})).await?;
//! ```

mod credentials;
mod error;
mod ident;
mod results;
mod schema;
mod types;

pub use error::{DbError, Result};
pub use ident::validate_identifier;
pub use types::*;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Handle to the casdrop database. Clone is cheap and shares the pool.
#[derive(Clone)]
pub struct CasDropDb {
    pool: SqlitePool,
    tables: Arc<TableNames>,
}

impl CasDropDb {
    /// Open or create a database at the given path.
    ///
    /// Creates both tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>, tables: TableNames) -> Result<Self> {
        let path = path.as_ref();
        tables.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Pragmas here apply to every pooled connection, not just the first.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            tables: Arc::new(tables),
        };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Open a private in-memory database (for testing).
    pub async fn open_memory(tables: TableNames) -> Result<Self> {
        tables.validate()?;

        // Each in-memory connection is its own database.
        let options = "sqlite::memory:"
            .parse::<SqliteConnectOptions>()?
            .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            tables: Arc::new(tables),
        };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Get the underlying connection pool (escape hatch for complex queries).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl CasDropDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert milliseconds to DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(chrono::Utc::now)
    }
}
