//! File credential operations.
//!
//! Credentials are written out-of-band (CLI, upload service) and only read by
//! the ingestion pipeline.

use crate::error::Result;
use crate::types::FileCredential;
use crate::CasDropDb;
use chrono::{DateTime, Utc};
use sqlx::Row;

impl CasDropDb {
    /// Insert or replace the credential for a file name.
    pub async fn credential_put(
        &self,
        file_name: &str,
        password: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let now = Self::now_millis();

        sqlx::query(&format!(
            r#"
            INSERT INTO "{}" (file_name, password, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(file_name) DO UPDATE SET
                password = excluded.password,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            "#,
            self.tables.credentials
        ))
        .bind(file_name)
        .bind(password)
        .bind(now)
        .bind(expires_at.map(|at| at.timestamp_millis()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up the live credential for a file name.
    ///
    /// Rows whose `expires_at` has passed are treated as absent, the same
    /// result a TTL index on `expires_at` gives in a document store. They stay
    /// in the table until removed and still show up in [`Self::credential_list`].
    /// Rows without `expires_at` never expire.
    pub async fn credential_find(&self, file_name: &str) -> Result<Option<FileCredential>> {
        let row = sqlx::query(&format!(
            r#"SELECT file_name, password, created_at, expires_at FROM "{}"
               WHERE file_name = ? AND (expires_at IS NULL OR expires_at > ?)"#,
            self.tables.credentials
        ))
        .bind(file_name)
        .bind(Self::now_millis())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_credential))
    }

    /// Remove a credential. Returns whether a row was deleted.
    pub async fn credential_remove(&self, file_name: &str) -> Result<bool> {
        let result = sqlx::query(&format!(
            r#"DELETE FROM "{}" WHERE file_name = ?"#,
            self.tables.credentials
        ))
        .bind(file_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List all credentials, including expired ones, ordered by file name.
    pub async fn credential_list(&self) -> Result<Vec<FileCredential>> {
        let rows = sqlx::query(&format!(
            r#"SELECT file_name, password, created_at, expires_at FROM "{}" ORDER BY file_name"#,
            self.tables.credentials
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_credential).collect())
    }
}

fn row_to_credential(row: &sqlx::sqlite::SqliteRow) -> FileCredential {
    FileCredential {
        file_name: row.get("file_name"),
        password: row.get("password"),
        created_at: CasDropDb::millis_to_datetime(row.get("created_at")),
        expires_at: row
            .get::<Option<i64>, _>("expires_at")
            .map(CasDropDb::millis_to_datetime),
    }
}
