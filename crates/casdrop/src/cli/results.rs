//! `casdrop results` - inspect parsed statements.

use crate::cli::output::{format_timestamp, print_json, print_table};
use anyhow::{Context, Result};
use casdrop_db::{CasDropDb, ParsedResult};
use casdrop_ingest::IngestConfig;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ResultsAction {
    /// List stored results, newest first
    List {
        /// Only results for this file name
        #[arg(long)]
        file: Option<String>,

        /// Maximum rows
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Output full documents as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(config: &IngestConfig, action: ResultsAction) -> Result<()> {
    let db = CasDropDb::open(&config.database_path, config.table_names()?)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    let result = match action {
        ResultsAction::List { file, limit, json } => list(&db, file.as_deref(), limit, json).await,
    };
    db.close().await;
    result
}

async fn list(db: &CasDropDb, file: Option<&str>, limit: usize, json: bool) -> Result<()> {
    let results = db.result_list(file, limit).await?;
    if json {
        return print_json(&results);
    }
    if results.is_empty() {
        println!("No results stored.");
        return Ok(());
    }

    let rows = results
        .iter()
        .map(|result| {
            vec![
                result.id.to_string(),
                result.file_name.clone(),
                format_timestamp(&result.created_at),
                summarize(result),
            ]
        })
        .collect();
    print_table(&["ID", "FILE", "STORED", "SUMMARY"], rows);
    Ok(())
}

/// One-line description of a parsed CAS document.
fn summarize(result: &ParsedResult) -> String {
    let file_type = result
        .data
        .get("file_type")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let folios = result
        .data
        .get("folios")
        .and_then(|v| v.as_array())
        .map(|f| f.len())
        .unwrap_or(0);
    format!("{} ({} folios)", file_type, folios)
}
