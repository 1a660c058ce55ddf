//! casdrop
//!
//! Watches a drop directory for CAS statement PDFs, parses each with its
//! registered password, stores the result and removes the file.
//!
//! Usage:
//!     casdrop watch --dir /tmp/casparser
//!     casdrop credential add CAS-01.pdf --password secret --expires-in 30
//!     casdrop results list --file CAS-01.pdf

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "casdrop", about = "Watch-folder ingestion for CAS statements")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Config file (TOML). Defaults to ~/.casdrop/casdrop.toml when present.
    #[arg(long, global = true, env = "CASDROP_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true, env = "CASDROP_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the drop directory and ingest new statements until interrupted
    Watch(cli::watch::WatchArgs),

    /// Manage file credentials
    Credential {
        #[command(subcommand)]
        action: cli::credential::CredentialAction,
    },

    /// Inspect stored parse results
    Results {
        #[command(subcommand)]
        action: cli::results::ResultsAction,
    },

    /// Show the effective configuration
    Config {
        /// Also write it to this path
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = cli::config::Overrides {
        database: cli.database,
        ..Default::default()
    };

    match cli.command {
        Commands::Watch(args) => {
            let overrides = cli::config::Overrides {
                watch_dir: args.dir.clone(),
                workers: args.workers,
                extension: args.extension.clone(),
                ..overrides
            };
            let config = cli::config::resolve(cli.config.as_deref(), &overrides)?;
            cli::watch::run(config).await
        }
        Commands::Credential { action } => {
            let config = cli::config::resolve(cli.config.as_deref(), &overrides)?;
            cli::credential::run(&config, action).await
        }
        Commands::Results { action } => {
            let config = cli::config::resolve(cli.config.as_deref(), &overrides)?;
            cli::results::run(&config, action).await
        }
        Commands::Config { write } => {
            let config = cli::config::resolve(cli.config.as_deref(), &overrides)?;
            cli::config::show(&config, write.as_deref())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let is_watch = matches!(cli.command, Commands::Watch(_));
    let _log_guard = match casdrop_logging::init_logging(casdrop_logging::LogConfig {
        app_name: "casdrop",
        verbose: cli.verbose || is_watch,
        file: is_watch,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: logging unavailable: {err:#}");
            None
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
