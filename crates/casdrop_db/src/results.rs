//! Parsed statement operations. Insert-only.

use crate::error::Result;
use crate::types::ParsedResult;
use crate::CasDropDb;
use sqlx::Row;

impl CasDropDb {
    /// Insert a parsed document for a file name and return its row id.
    ///
    /// There is no existence check: inserting the same file name twice
    /// stores two rows.
    pub async fn result_insert(&self, file_name: &str, data: &serde_json::Value) -> Result<i64> {
        let data_json = serde_json::to_string(data)?;

        let result = sqlx::query(&format!(
            r#"INSERT INTO "{}" (file_name, data, created_at) VALUES (?, ?, ?)"#,
            self.tables.results
        ))
        .bind(file_name)
        .bind(&data_json)
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// List stored results, newest first, optionally for one file name.
    pub async fn result_list(
        &self,
        file_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ParsedResult>> {
        let table = &self.tables.results;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = match file_name {
            Some(name) => {
                sqlx::query(&format!(
                    r#"SELECT id, file_name, data, created_at FROM "{table}"
                       WHERE file_name = ? ORDER BY id DESC LIMIT ?"#
                ))
                .bind(name)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"SELECT id, file_name, data, created_at FROM "{table}"
                       ORDER BY id DESC LIMIT ?"#
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_result).collect()
    }

    /// Number of stored results for a file name.
    pub async fn result_count(&self, file_name: &str) -> Result<i64> {
        let row = sqlx::query(&format!(
            r#"SELECT COUNT(*) AS n FROM "{}" WHERE file_name = ?"#,
            self.tables.results
        ))
        .bind(file_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("n"))
    }
}

fn row_to_result(row: &sqlx::sqlite::SqliteRow) -> Result<ParsedResult> {
    let data_json: String = row.get("data");
    Ok(ParsedResult {
        id: row.get("id"),
        file_name: row.get("file_name"),
        data: serde_json::from_str(&data_json)?,
        created_at: CasDropDb::millis_to_datetime(row.get("created_at")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableNames;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = CasDropDb::open_memory(TableNames::default()).await.unwrap();
        let doc = json!({"statement_period": {"from": "01-Jan-2024"}, "folios": []});

        let id = db.result_insert("stmt_jan.pdf", &doc).await.unwrap();
        assert!(id > 0);

        let rows = db.result_list(Some("stmt_jan.pdf"), 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].data, doc);
        assert!(db.result_list(Some("other.pdf"), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_inserts_are_kept() {
        let db = CasDropDb::open_memory(TableNames::default()).await.unwrap();
        db.result_insert("a.pdf", &json!({"n": 1})).await.unwrap();
        db.result_insert("a.pdf", &json!({"n": 2})).await.unwrap();
        db.result_insert("b.pdf", &json!({"n": 3})).await.unwrap();

        assert_eq!(db.result_count("a.pdf").await.unwrap(), 2);
        let all = db.result_list(None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        // Newest first.
        assert_eq!(all[0].file_name, "b.pdf");
        assert_eq!(db.result_list(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_custom_table_names() {
        let tables = TableNames::new("creds", "statements").unwrap();
        let db = CasDropDb::open_memory(tables).await.unwrap();
        db.result_insert("a.pdf", &json!({})).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS n FROM statements")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 1);
    }
}
