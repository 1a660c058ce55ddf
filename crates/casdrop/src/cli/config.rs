//! Effective configuration: file, then CLI/env overrides.

use anyhow::{Context, Result};
use casdrop_ingest::IngestConfig;
use std::path::{Path, PathBuf};

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub watch_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub extension: Option<String>,
}

/// Default config file: ~/.casdrop/casdrop.toml
pub fn default_config_path() -> PathBuf {
    casdrop_logging::casdrop_home().join("casdrop.toml")
}

/// Load the config file (explicit path, else the default one if it exists,
/// else built-in defaults), apply overrides and validate.
pub fn resolve(explicit: Option<&Path>, overrides: &Overrides) -> Result<IngestConfig> {
    let mut config = match explicit {
        Some(path) => IngestConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                IngestConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?
            } else {
                IngestConfig::default()
            }
        }
    };

    apply(&mut config, overrides);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn apply(config: &mut IngestConfig, overrides: &Overrides) {
    if let Some(database) = &overrides.database {
        config.database_path = database.clone();
    }
    if let Some(dir) = &overrides.watch_dir {
        config.watch_dir = dir.clone();
    }
    if let Some(workers) = overrides.workers {
        config.workers = workers;
    }
    if let Some(extension) = &overrides.extension {
        config.extension = extension.clone();
    }
}

/// Print the config as TOML, optionally saving it.
pub fn show(config: &IngestConfig, write: Option<&Path>) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    println!("{}", rendered);

    if let Some(path) = write {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        config
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
