//! Bounded worker pool that runs pipelines.
//!
//! A fixed number of long-lived workers pull candidates from one bounded
//! queue, so at most `workers` pipelines run at once and `submit` blocks
//! when the queue is full. Each run executes in its own task: a panic ends
//! that run only.

use crate::error::DispatchError;
use crate::pipeline::{Cleanup, Pipeline, PipelineOutcome};
use crate::watcher::CandidateFile;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub submitted: u64,
    pub completed: u64,
    pub panicked: u64,
    pub processed: u64,
    pub not_recognized: u64,
    pub lookup_failed: u64,
    pub parse_failed: u64,
    pub persist_failed: u64,
    pub cleanup_failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
    processed: AtomicU64,
    not_recognized: AtomicU64,
    lookup_failed: AtomicU64,
    parse_failed: AtomicU64,
    persist_failed: AtomicU64,
    cleanup_failed: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: &PipelineOutcome) {
        let counter = match outcome {
            PipelineOutcome::Processed { cleanup, .. } => {
                if matches!(cleanup, Cleanup::Failed(_)) {
                    self.cleanup_failed.fetch_add(1, Ordering::Relaxed);
                }
                &self.processed
            }
            PipelineOutcome::NotRecognized => &self.not_recognized,
            PipelineOutcome::LookupFailed(_) => &self.lookup_failed,
            PipelineOutcome::ParseFailed(_) => &self.parse_failed,
            PipelineOutcome::PersistFailed(_) => &self.persist_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        // Last, so a reader that sees `completed` also sees the outcome.
        self.completed.fetch_add(1, Ordering::Release);
    }

    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Acquire),
            panicked: self.panicked.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            not_recognized: self.not_recognized.load(Ordering::Relaxed),
            lookup_failed: self.lookup_failed.load(Ordering::Relaxed),
            parse_failed: self.parse_failed.load(Ordering::Relaxed),
            persist_failed: self.persist_failed.load(Ordering::Relaxed),
            cleanup_failed: self.cleanup_failed.load(Ordering::Relaxed),
        }
    }
}

pub struct Dispatcher {
    tx: mpsc::Sender<CandidateFile>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Spawn `workers` worker tasks sharing a queue of `queue_capacity`.
    ///
    /// Must be called inside a Tokio runtime. Zero values are raised to 1.
    pub fn start(pipeline: Arc<Pipeline>, workers: usize, queue_capacity: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        let handles = (0..workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&rx),
                    Arc::clone(&pipeline),
                    Arc::clone(&counters),
                ))
            })
            .collect();

        info!(workers, queue_capacity, "Dispatcher started");
        Self {
            tx,
            workers: handles,
            counters,
        }
    }

    /// Queue a candidate, waiting while the queue is full.
    pub async fn submit(&self, candidate: CandidateFile) -> Result<(), DispatchError> {
        self.tx
            .send(candidate)
            .await
            .map_err(|_| DispatchError::Closed)?;
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Stop accepting work, drain queued and in-flight runs, join workers.
    pub async fn shutdown(self) -> DispatchStats {
        let Dispatcher {
            tx,
            workers,
            counters,
        } = self;
        drop(tx);

        for handle in workers {
            if let Err(e) = handle.await {
                error!("Dispatcher worker ended abnormally: {}", e);
            }
        }

        let stats = counters.snapshot();
        info!(
            submitted = stats.submitted,
            completed = stats.completed,
            processed = stats.processed,
            not_recognized = stats.not_recognized,
            lookup_failed = stats.lookup_failed,
            parse_failed = stats.parse_failed,
            persist_failed = stats.persist_failed,
            cleanup_failed = stats.cleanup_failed,
            panicked = stats.panicked,
            "Dispatcher drained"
        );
        stats
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<CandidateFile>>>,
    pipeline: Arc<Pipeline>,
    counters: Arc<Counters>,
) {
    loop {
        // Lock is held only while idle-waiting; busy workers never touch it.
        let next = rx.lock().await.recv().await;
        let Some(candidate) = next else {
            break;
        };

        let name = candidate.name.clone();
        let pipeline = Arc::clone(&pipeline);
        let run = tokio::spawn(async move { pipeline.run(&candidate).await });

        match run.await {
            Ok(outcome) => {
                debug!(worker_id, file = %name, outcome = outcome.label(), "Pipeline finished");
                counters.record(&outcome);
            }
            Err(e) => {
                counters.panicked.fetch_add(1, Ordering::Relaxed);
                error!(worker_id, file = %name, "Pipeline run aborted: {}", e);
            }
        }
    }
    debug!(worker_id, "Worker exiting");
}
