//! `casdrop watch` - the ingestion service.

use anyhow::{Context, Result};
use casdrop_db::CasDropDb;
use casdrop_ingest::{run_ingest, CommandParser, IngestConfig, Pipeline};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Directory to watch for new statements
    #[arg(long, env = "DIRECTORY_TO_WATCH")]
    pub dir: Option<PathBuf>,

    /// Maximum statements processed at once
    #[arg(long, env = "CASDROP_WORKERS")]
    pub workers: Option<usize>,

    /// Extension (without dot) of files to ingest
    #[arg(long)]
    pub extension: Option<String>,
}

pub async fn run(config: IngestConfig) -> Result<()> {
    std::fs::create_dir_all(&config.watch_dir).with_context(|| {
        format!("Failed to create watch directory {}", config.watch_dir.display())
    })?;

    let db = CasDropDb::open(&config.database_path, config.table_names()?)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    let parser = CommandParser::new(&config.parser);

    info!("Starting casdrop");
    info!("  Watching: {}", config.watch_dir.display());
    info!("  Database: {}", config.database_path.display());
    info!("  Parser: {}", parser.program());
    info!("  Workers: {}", config.workers);

    let pipeline = Arc::new(Pipeline::new(
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(parser),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    install_shutdown_handler(shutdown_tx)?;

    let stats = run_ingest(&config, pipeline, shutdown_rx)
        .await
        .context("Ingestion stopped with an error")?;

    info!(
        processed = stats.processed,
        skipped = stats.not_recognized,
        failed = stats.parse_failed + stats.persist_failed + stats.lookup_failed,
        "Shutdown complete"
    );
    db.close().await;
    Ok(())
}

/// Exit status used when a second signal cuts the drain short.
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum SignalAction {
    /// First signal: stop watching and drain in-flight work.
    Drain,
    /// Shutdown was already requested: exit without waiting.
    ForceExit,
}

fn on_signal(shutdown_tx: &watch::Sender<bool>) -> SignalAction {
    if shutdown_tx.send_replace(true) {
        SignalAction::ForceExit
    } else {
        SignalAction::Drain
    }
}

fn handle_signal(shutdown_tx: &watch::Sender<bool>, source: &str) {
    match on_signal(shutdown_tx) {
        SignalAction::Drain => {
            info!("Received {}, shutting down (repeat to force quit)...", source);
        }
        SignalAction::ForceExit => {
            warn!("Received {} again, exiting without draining", source);
            std::process::exit(FORCED_EXIT_CODE);
        }
    }
}

fn install_shutdown_handler(shutdown_tx: watch::Sender<bool>) -> Result<()> {
    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        std::thread::spawn(move || {
            for sig in signals.forever() {
                handle_signal(&shutdown_tx, &format!("signal {}", sig));
            }
        });
    }

    #[cfg(windows)]
    {
        ctrlc::set_handler(move || handle_signal(&shutdown_tx, "Ctrl+C"))?;
    }

    Ok(())
}
