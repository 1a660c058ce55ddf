//! Error types for the ingestion pipeline

use std::io;
use thiserror::Error;

/// Credential store / result sink failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] casdrop_db::DbError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Statement parser failure. The source file is kept when this happens.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parser '{program}' could not be started: {message}")]
    Spawn { program: String, message: String },

    #[error("Parser exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Parser output is not valid JSON: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    #[error("Cannot parse statement: {0}")]
    Rejected(String),
}

/// Dispatcher submission failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatcher is shut down")]
    Closed,
}

/// Filesystem watch setup failure.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Watch directory is not a directory: {0}")]
    NotADirectory(String),
}

/// Configuration failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
