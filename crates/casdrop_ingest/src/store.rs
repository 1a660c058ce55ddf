//! Storage seams used by the pipeline.
//!
//! The pipeline only sees these traits, so tests can substitute in-memory
//! stores. [`CasDropDb`] implements both.

use crate::error::StoreError;
use async_trait::async_trait;
use casdrop_db::{CasDropDb, FileCredential};

/// Read-only lookup of decryption passwords by file name.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the credential for `file_name`.
    ///
    /// `Ok(None)` means the file is not recognized.
    async fn find(&self, file_name: &str) -> Result<Option<FileCredential>, StoreError>;
}

/// Insert-only persistence of parsed statements.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Store `data` for `file_name` and return the new record id.
    async fn insert(&self, file_name: &str, data: &serde_json::Value) -> Result<i64, StoreError>;
}

#[async_trait]
impl CredentialStore for CasDropDb {
    async fn find(&self, file_name: &str) -> Result<Option<FileCredential>, StoreError> {
        Ok(self.credential_find(file_name).await?)
    }
}

#[async_trait]
impl ResultSink for CasDropDb {
    async fn insert(&self, file_name: &str, data: &serde_json::Value) -> Result<i64, StoreError> {
        Ok(self.result_insert(file_name, data).await?)
    }
}
