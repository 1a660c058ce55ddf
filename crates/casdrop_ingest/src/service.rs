//! Service loop tying the watcher to the dispatcher.

use crate::config::IngestConfig;
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::error::WatchError;
use crate::pipeline::Pipeline;
use crate::watcher::FileWatcher;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Watch `config.watch_dir` and process candidates until `shutdown` turns
/// true (or its sender is dropped).
///
/// On stop the watch handle is released first, then queued and in-flight
/// pipelines are allowed to finish.
pub async fn run_ingest(
    config: &IngestConfig,
    pipeline: Arc<Pipeline>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<DispatchStats, WatchError> {
    let (watcher, mut candidates) =
        FileWatcher::start(&config.watch_dir, &config.extension, config.queue_capacity)?;
    let dispatcher = Dispatcher::start(pipeline, config.workers, config.queue_capacity);

    info!(
        dir = %config.watch_dir.display(),
        extension = %config.extension,
        workers = config.workers,
        "Ingestion running"
    );

    if !*shutdown.borrow() {
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested");
                        break;
                    }
                }
                next = candidates.recv() => match next {
                    Some(candidate) => {
                        if let Err(e) = dispatcher.submit(candidate).await {
                            error!("Cannot dispatch candidate: {}", e);
                            break;
                        }
                    }
                    None => {
                        warn!("Watcher channel closed");
                        break;
                    }
                },
            }
        }
    }

    // Closing the channel first unblocks a notification thread stuck on a full queue.
    drop(candidates);
    watcher.stop();

    Ok(dispatcher.shutdown().await)
}
