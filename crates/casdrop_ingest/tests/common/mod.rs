//! In-memory stand-ins for the store, sink and parser.
#![allow(dead_code)]

use async_trait::async_trait;
use casdrop_ingest::{
    CandidateFile, CredentialStore, FileCredential, ParseError, Pipeline, ResultSink,
    StatementParser, StoreError,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
pub struct MemoryCredentials {
    passwords: Mutex<HashMap<String, String>>,
    pub fail: bool,
}

impl MemoryCredentials {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        let passwords = entries
            .iter()
            .map(|(name, pw)| (name.to_string(), pw.to_string()))
            .collect();
        Self {
            passwords: Mutex::new(passwords),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            passwords: Mutex::new(HashMap::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn find(&self, file_name: &str) -> Result<Option<FileCredential>, StoreError> {
        if self.fail {
            return Err(StoreError::Unavailable("credential store offline".to_string()));
        }
        let passwords = self.passwords.lock().unwrap();
        Ok(passwords.get(file_name).map(|password| FileCredential {
            file_name: file_name.to_string(),
            password: password.clone(),
            created_at: Utc::now(),
            expires_at: None,
        }))
    }
}

#[derive(Default)]
pub struct MemorySink {
    rows: Mutex<Vec<(String, Value)>>,
    pub fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn rows(&self) -> Vec<(String, Value)> {
        self.rows.lock().unwrap().clone()
    }

    pub fn count(&self, file_name: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == file_name)
            .count()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn insert(&self, file_name: &str, data: &Value) -> Result<i64, StoreError> {
        if self.fail {
            return Err(StoreError::Unavailable("sink rejected insert".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        rows.push((file_name.to_string(), data.clone()));
        Ok(rows.len() as i64)
    }
}

/// Accepts one password, optionally sleeps, and tracks concurrency.
pub struct FakeParser {
    password: String,
    delay: Duration,
    panic_on: Option<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FakeParser {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            delay: Duration::ZERO,
            panic_on: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn panicking_on(mut self, file_name: &str) -> Self {
        self.panic_on = Some(file_name.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatementParser for FakeParser {
    async fn parse(&self, path: &Path, password: &str) -> Result<Value, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.seen.lock().unwrap().push(name.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_on.as_deref() == Some(name.as_str()) {
            panic!("parser crashed on {name}");
        }
        if password != self.password {
            return Err(ParseError::Rejected("Incorrect PDF password!".to_string()));
        }
        Ok(json!({
            "file_type": "CAMS",
            "source": name,
            "folios": [{"folio": "1234/56", "schemes": []}],
        }))
    }
}

pub fn pipeline(
    credentials: Arc<MemoryCredentials>,
    sink: Arc<MemorySink>,
    parser: Arc<FakeParser>,
) -> Arc<Pipeline> {
    Arc::new(Pipeline::new(credentials, sink, parser))
}

/// Write a fake statement into `dir` and return it as a candidate.
pub fn drop_file(dir: &TempDir, name: &str) -> CandidateFile {
    let path: PathBuf = dir.path().join(name);
    std::fs::write(&path, b"%PDF-1.4 fake statement").unwrap();
    CandidateFile::from_path(path).unwrap()
}
