//! Per-file ingestion: credential lookup, parse, persist, delete.
//!
//! Every failure stays inside the run for its file and is reported through
//! [`PipelineOutcome`] and the log. Nothing is retried here; a new creation
//! event for the same path is the retry mechanism.

use crate::parser::StatementParser;
use crate::store::{CredentialStore, ResultSink};
use crate::watcher::CandidateFile;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// What happened to the source file after a successful insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    Removed,
    /// The result is stored; the source file could not be deleted.
    Failed(String),
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Result stored. Cleanup failure does not change this.
    Processed { result_id: i64, cleanup: Cleanup },
    /// No credential for the file name. File left untouched.
    NotRecognized,
    /// Credential store error. File left untouched.
    LookupFailed(String),
    /// Parser rejected the file. File kept for inspection or re-drop.
    ParseFailed(String),
    /// Sink rejected the insert. File kept.
    PersistFailed(String),
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Processed { .. })
    }

    /// Short stable name, used in logs and counters.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineOutcome::Processed {
                cleanup: Cleanup::Removed,
                ..
            } => "processed",
            PipelineOutcome::Processed {
                cleanup: Cleanup::Failed(_),
                ..
            } => "processed_cleanup_failed",
            PipelineOutcome::NotRecognized => "not_recognized",
            PipelineOutcome::LookupFailed(_) => "lookup_failed",
            PipelineOutcome::ParseFailed(_) => "parse_failed",
            PipelineOutcome::PersistFailed(_) => "persist_failed",
        }
    }
}

/// Orchestrates one file through the store, parser and sink.
///
/// Holds no per-file state, so one instance is shared by all workers.
pub struct Pipeline {
    credentials: Arc<dyn CredentialStore>,
    sink: Arc<dyn ResultSink>,
    parser: Arc<dyn StatementParser>,
}

impl Pipeline {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sink: Arc<dyn ResultSink>,
        parser: Arc<dyn StatementParser>,
    ) -> Self {
        Self {
            credentials,
            sink,
            parser,
        }
    }

    /// Process one candidate file to completion.
    pub async fn run(&self, candidate: &CandidateFile) -> PipelineOutcome {
        let span = info_span!("pipeline", file = %candidate.name);
        self.run_steps(candidate).instrument(span).await
    }

    async fn run_steps(&self, candidate: &CandidateFile) -> PipelineOutcome {
        info!(path = %candidate.path.display(), "Processing file");

        let credential = match self.credentials.find(&candidate.name).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                info!("No credential registered; skipping");
                return PipelineOutcome::NotRecognized;
            }
            Err(e) => {
                error!(error = %e, "Credential lookup failed");
                return PipelineOutcome::LookupFailed(e.to_string());
            }
        };

        let data = match self
            .parser
            .parse(&candidate.path, &credential.password)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Parse failed; keeping file");
                return PipelineOutcome::ParseFailed(e.to_string());
            }
        };

        let result_id = match self.sink.insert(&candidate.name, &data).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Failed to store parsed data; keeping file");
                return PipelineOutcome::PersistFailed(e.to_string());
            }
        };
        info!(result_id, "File parsed and data stored");

        let cleanup = match tokio::fs::remove_file(&candidate.path).await {
            Ok(()) => {
                info!("File deleted after processing");
                Cleanup::Removed
            }
            Err(e) => {
                error!(error = %e, path = %candidate.path.display(), "Failed to delete processed file");
                Cleanup::Failed(e.to_string())
            }
        };

        PipelineOutcome::Processed { result_id, cleanup }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        let processed = PipelineOutcome::Processed {
            result_id: 1,
            cleanup: Cleanup::Removed,
        };
        let dirty = PipelineOutcome::Processed {
            result_id: 2,
            cleanup: Cleanup::Failed("permission denied".to_string()),
        };

        assert!(processed.is_success());
        assert!(dirty.is_success());
        assert_eq!(dirty.label(), "processed_cleanup_failed");
        assert!(!PipelineOutcome::NotRecognized.is_success());
        assert!(!PipelineOutcome::ParseFailed("bad".into()).is_success());
        assert_eq!(PipelineOutcome::PersistFailed("x".into()).label(), "persist_failed");
    }
}
