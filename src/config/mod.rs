mod file_config;

pub use file_config::{EditorConfig, FileConfig, MigrationConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub history_capacity: Option<usize>,
    pub migrate_on_save: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub history_capacity: usize,
    pub migrate_on_save: bool,
    pub log_level: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db or in config file")
            })?;
        if db_path.is_dir() {
            bail!("db_path points to a directory: {:?}", db_path);
        }

        let history_capacity = file
            .editor
            .and_then(|e| e.history_capacity)
            .or(cli.history_capacity)
            .unwrap_or(DEFAULT_HISTORY_CAPACITY);
        if history_capacity == 0 {
            bail!("history_capacity must be at least 1");
        }

        let migrate_on_save = file
            .migration
            .and_then(|m| m.migrate_on_save)
            .or(cli.migrate_on_save)
            .unwrap_or(true);

        let log_level = file
            .log_level
            .or_else(|| cli.log_level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            db_path,
            history_capacity,
            migrate_on_save,
            log_level,
        })
    }
}
