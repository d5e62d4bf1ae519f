//! Runtime settings, read from an optional TOML file.
//!
//! ```toml
//! database_path = "db.sqlite3"
//! due_limit = 20
//! max_conflict_retries = 5
//! ```

use crate::error::Result;
use crate::models::due::DEFAULT_DUE_LIMIT;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// Cards returned by a due query that does not set its own limit.
    pub due_limit: usize,
    /// Extra attempts after a review loses a write race on its card.
    pub max_conflict_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db.sqlite3"),
            due_limit: DEFAULT_DUE_LIMIT,
            max_conflict_retries: 5,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reads `path` when given, otherwise falls back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
