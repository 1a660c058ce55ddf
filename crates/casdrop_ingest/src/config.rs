//! Configuration for the ingestion service

use crate::error::ConfigError;
use casdrop_db::{TableNames, DEFAULT_CREDENTIALS_TABLE, DEFAULT_RESULTS_TABLE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the ingestion service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory watched (non-recursively) for new statements
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,

    /// File extension that makes a created file a candidate, without the dot.
    /// Matched case-sensitively.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Concurrency ceiling: pipelines running at once
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Candidates buffered before submission blocks
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Path to the SQLite database
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_credentials_table")]
    pub credentials_table: String,

    #[serde(default = "default_results_table")]
    pub results_table: String,

    #[serde(default)]
    pub parser: ParserConfig,
}

/// External statement parser invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Program to run, looked up on PATH when not absolute
    #[serde(default = "default_parser_program")]
    pub program: String,

    /// Arguments placed before the password/output/file arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_watch_dir() -> PathBuf {
    std::env::temp_dir().join("casparser")
}

fn default_extension() -> String {
    "pdf".to_string()
}

fn default_workers() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    100
}

fn default_database_path() -> PathBuf {
    std::env::var_os("CASDROP_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".casdrop")))
        .map(|home| home.join("casdrop.sqlite3"))
        .unwrap_or_else(|| PathBuf::from("casdrop.sqlite3"))
}

fn default_credentials_table() -> String {
    DEFAULT_CREDENTIALS_TABLE.to_string()
}

fn default_results_table() -> String {
    DEFAULT_RESULTS_TABLE.to_string()
}

fn default_parser_program() -> String {
    "casparser".to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            program: default_parser_program(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            extension: default_extension(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            database_path: default_database_path(),
            credentials_table: default_credentials_table(),
            results_table: default_results_table(),
            parser: ParserConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: IngestConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "extension must be non-empty and given without a leading dot, got '{}'",
                self.extension
            )));
        }
        if self.parser.program.trim().is_empty() {
            return Err(ConfigError::Invalid("parser.program is empty".to_string()));
        }
        self.table_names()?;
        Ok(())
    }

    /// Validated table names for the store.
    pub fn table_names(&self) -> Result<TableNames, ConfigError> {
        TableNames::new(&self.credentials_table, &self.results_table)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.workers, 10);
        assert_eq!(config.extension, "pdf");
        assert_eq!(config.credentials_table, "file_credentials");
        assert_eq!(config.results_table, "parsed_cas_data");
        assert_eq!(config.parser.program, "casparser");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: IngestConfig = toml::from_str(
            r#"
            watch_dir = "/srv/drop"
            workers = 4

            [parser]
            program = "/opt/casparser/bin/casparser"
            "#,
        )
        .unwrap();

        assert_eq!(config.watch_dir, PathBuf::from("/srv/drop"));
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.parser.program, "/opt/casparser/bin/casparser");
        assert!(config.parser.extra_args.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("casdrop.toml");
        let config = IngestConfig {
            watch_dir: tmp.path().join("drop"),
            workers: 3,
            results_table: "statements".to_string(),
            ..IngestConfig::default()
        };

        config.save(&path).unwrap();
        let loaded = IngestConfig::load(&path).unwrap();
        assert_eq!(loaded.watch_dir, config.watch_dir);
        assert_eq!(loaded.workers, 3);
        assert_eq!(loaded.results_table, "statements");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_workers = IngestConfig {
            workers: 0,
            ..IngestConfig::default()
        };
        assert!(zero_workers.validate().is_err());

        let dotted = IngestConfig {
            extension: ".pdf".to_string(),
            ..IngestConfig::default()
        };
        assert!(dotted.validate().is_err());

        let bad_table = IngestConfig {
            credentials_table: "file credentials".to_string(),
            ..IngestConfig::default()
        };
        assert!(matches!(bad_table.validate(), Err(ConfigError::Invalid(_))));
    }
}
