//! Service configuration.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable naming the corpus file.
pub const DATA_FILE_ENV: &str = "DATA_FILE";

/// Corpus location used when `DATA_FILE` is unset, relative to the
/// working directory.
pub const DEFAULT_DATA_FILE: &str = "data/processed_fetvas.jsonl";

/// Settings for a [`SearchService`](crate::SearchService).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// JSON Lines corpus to load.
    pub data_file: PathBuf,
    /// Page size when a request does not give one.
    pub default_limit: usize,
    /// Score floor when a request does not give one.
    pub default_min_score: f64,
    /// The index is asked for `limit * result_window_factor + offset` hits
    /// (capped at the corpus size) so filtering and pagination have room.
    pub result_window_factor: usize,
    /// Queries with fewer normalized characters switch to browse mode.
    pub min_query_chars: usize,
    /// Autocomplete prefixes shorter than this return nothing.
    pub autocomplete_min_chars: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            default_limit: 20,
            default_min_score: 0.1,
            result_window_factor: 5,
            min_query_chars: 2,
            autocomplete_min_chars: 2,
        }
    }
}

impl ServiceConfig {
    /// Defaults, with the corpus path taken from `DATA_FILE` and resolved
    /// against the working directory.
    pub fn from_env() -> Self {
        let cwd = env::current_dir().unwrap_or_default();
        let data_file = resolve_data_file(env::var(DATA_FILE_ENV).ok().as_deref(), &cwd);
        Self {
            data_file,
            ..Self::default()
        }
    }

    /// Replaces the corpus path.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }
}

/// Picks the corpus path from an optional override.
///
/// A blank override counts as unset. Relative paths are joined to `cwd`.
pub fn resolve_data_file(value: Option<&str>, cwd: &Path) -> PathBuf {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
        Some(path) => cwd.join(path),
        None => cwd.join(DEFAULT_DATA_FILE),
    }
}
