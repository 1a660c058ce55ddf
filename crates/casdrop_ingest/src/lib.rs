//! casdrop ingestion pipeline
//!
//! Watches a drop directory for CAS statement PDFs and turns each one into a
//! stored JSON document.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────────────────┐
//! │ FileWatcher │     │ Dispatcher  │     │ Pipeline                     │
//! │  (notify,   │────▶│ (N workers, │────▶│ credential → parse → insert  │
//! │  *.pdf)     │     │ bounded q)  │     │ → delete source file         │
//! └─────────────┘     └─────────────┘     └──────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **CandidateFile**: a created file that passed the extension filter
//! - **CredentialStore**: file name → decryption password
//! - **StatementParser**: (file, password) → JSON document
//! - **ResultSink**: insert-only storage of parsed documents

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod watcher;

// Re-exports for convenience
pub use casdrop_db::{FileCredential, ParsedResult};
pub use config::{IngestConfig, ParserConfig};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{ConfigError, DispatchError, ParseError, StoreError, WatchError};
pub use parser::{CommandParser, StatementParser};
pub use pipeline::{Cleanup, Pipeline, PipelineOutcome};
pub use service::run_ingest;
pub use store::{CredentialStore, ResultSink};
pub use watcher::{candidates_from_event, matches_extension, CandidateFile, FileWatcher};
