//! Run configuration
//!
//! Defaults, optionally overridden by a TOML file, then by CLI flags and
//! environment (resolved by the binary).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default output table.
pub const DEFAULT_TARGET_TABLE: &str = "vendor_sales_summary";

/// Settings for one summary run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryConfig {
    /// SQLite database holding the base facts
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Table the summary is materialized into
    #[serde(default = "default_target_table")]
    pub target_table: String,

    /// Append-mode log file
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Rows printed in the console sample
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("inventory.db")
}

fn default_target_table() -> String {
    DEFAULT_TARGET_TABLE.to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/ingestion_db.log")
}

fn default_sample_rows() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            target_table: default_target_table(),
            log_file: default_log_file(),
            sample_rows: default_sample_rows(),
            log_level: default_log_level(),
        }
    }
}

/// Values supplied on the command line (or through their env fallbacks).
/// `None` leaves the file/default value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub target_table: Option<String>,
    pub log_file: Option<PathBuf>,
    pub sample_rows: Option<usize>,
    pub log_level: Option<String>,
}

impl SummaryConfig {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path` if given, else from `VENDOR_SUMMARY_CONFIG` if set,
    /// else defaults. An explicitly named file that fails to load is an error.
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match std::env::var("VENDOR_SUMMARY_CONFIG") {
                Ok(env_path) => Self::load(&env_path),
                Err(_) => Ok(Self::default()),
            },
        }
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(db_path) = overrides.db_path {
            self.db_path = db_path;
        }
        if let Some(target_table) = overrides.target_table {
            self.target_table = target_table;
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = log_file;
        }
        if let Some(sample_rows) = overrides.sample_rows {
            self.sample_rows = sample_rows;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        self
    }
}
