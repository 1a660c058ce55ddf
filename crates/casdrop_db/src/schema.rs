//! Database schema creation.

use crate::error::Result;
use crate::CasDropDb;
use tracing::info;

impl CasDropDb {
    /// Ensure both tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        let credentials = &self.tables.credentials;
        let results = &self.tables.results;

        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS "{credentials}" (
                file_name TEXT PRIMARY KEY,
                password TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER
            )"#
        ))
        .execute(&self.pool)
        .await?;

        // No uniqueness on file_name: re-processing a file inserts a second row.
        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS "{results}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_name TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )"#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"CREATE INDEX IF NOT EXISTS "idx_{results}_file_name" ON "{results}"(file_name)"#
        ))
        .execute(&self.pool)
        .await?;

        info!(%credentials, %results, "Database schema verified");
        Ok(())
    }
}
