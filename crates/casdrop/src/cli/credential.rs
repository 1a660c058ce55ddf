//! `casdrop credential` - register passwords for statements before they are dropped.

use crate::cli::output::{format_timestamp, print_json, print_table};
use anyhow::{Context, Result};
use casdrop_db::CasDropDb;
use casdrop_ingest::IngestConfig;
use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum CredentialAction {
    /// Register (or replace) the password for a file name
    Add {
        /// File name as it will appear in the watched directory
        file_name: String,

        /// Decryption password for the statement
        #[arg(long, env = "CASDROP_PASSWORD", hide_env_values = true)]
        password: String,

        /// Expire the credential after this many minutes
        #[arg(long)]
        expires_in: Option<i64>,
    },

    /// Remove the credential for a file name
    Remove { file_name: String },

    /// List registered credentials (passwords are never shown)
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct CredentialView {
    file_name: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    expired: bool,
}

pub async fn run(config: &IngestConfig, action: CredentialAction) -> Result<()> {
    let db = CasDropDb::open(&config.database_path, config.table_names()?)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    let result = execute(&db, action).await;
    db.close().await;
    result
}

async fn execute(db: &CasDropDb, action: CredentialAction) -> Result<()> {
    match action {
        CredentialAction::Add {
            file_name,
            password,
            expires_in,
        } => {
            let expires_at = expiry_from_minutes(expires_in)?;
            db.credential_put(&file_name, &password, expires_at).await?;
            match expires_at {
                Some(at) => println!(
                    "Stored credential for {} (expires {})",
                    file_name,
                    format_timestamp(&at)
                ),
                None => println!("Stored credential for {}", file_name),
            }
        }
        CredentialAction::Remove { file_name } => {
            if db.credential_remove(&file_name).await? {
                println!("Removed credential for {}", file_name);
            } else {
                anyhow::bail!("No credential registered for {}", file_name);
            }
        }
        CredentialAction::List { json } => {
            let now = Utc::now();
            let views: Vec<CredentialView> = db
                .credential_list()
                .await?
                .into_iter()
                .map(|cred| CredentialView {
                    expired: cred.is_expired_at(now),
                    file_name: cred.file_name,
                    created_at: cred.created_at,
                    expires_at: cred.expires_at,
                })
                .collect();

            if json {
                return print_json(&views);
            }
            if views.is_empty() {
                println!("No credentials registered.");
                return Ok(());
            }
            let rows = views
                .iter()
                .map(|view| {
                    vec![
                        view.file_name.clone(),
                        format_timestamp(&view.created_at),
                        view.expires_at
                            .as_ref()
                            .map(format_timestamp)
                            .unwrap_or_else(|| "never".to_string()),
                        if view.expired { "expired" } else { "active" }.to_string(),
                    ]
                })
                .collect();
            print_table(&["FILE", "CREATED", "EXPIRES", "STATUS"], rows);
        }
    }
    Ok(())
}

fn expiry_from_minutes(minutes: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    match minutes {
        None => Ok(None),
        Some(m) if m <= 0 => anyhow::bail!("--expires-in must be a positive number of minutes"),
        Some(m) => Ok(Some(Utc::now() + Duration::minutes(m))),
    }
}
