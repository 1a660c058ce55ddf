//! Stored entities.

use crate::error::Result;
use crate::ident::validate_identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default table holding file credentials.
pub const DEFAULT_CREDENTIALS_TABLE: &str = "file_credentials";
/// Default table holding parsed statements.
pub const DEFAULT_RESULTS_TABLE: &str = "parsed_cas_data";

/// Names of the two tables the store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    pub credentials: String,
    pub results: String,
}

impl TableNames {
    /// Build validated table names.
    pub fn new(credentials: impl Into<String>, results: impl Into<String>) -> Result<Self> {
        let names = Self {
            credentials: credentials.into(),
            results: results.into(),
        };
        names.validate()?;
        Ok(names)
    }

    /// Check both names are plain SQL identifiers.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.credentials)?;
        validate_identifier(&self.results)?;
        Ok(())
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            credentials: DEFAULT_CREDENTIALS_TABLE.to_string(),
            results: DEFAULT_RESULTS_TABLE.to_string(),
        }
    }
}

/// Decryption password registered for a statement file name.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCredential {
    pub file_name: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    /// Lookups ignore the credential after this instant.
    pub expires_at: Option<DateTime<Utc>>,
}

impl FileCredential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

impl fmt::Debug for FileCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCredential")
            .field("file_name", &self.file_name)
            .field("password", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A parsed statement document stored for a file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResult {
    pub id: i64,
    pub file_name: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
