use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The URL the archive is hosted at.
pub const DEFAULT_BASE_URL: &str = "http://www.epta.eu.org/epndb";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the archive
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory the catalog snapshot is kept in
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Directory rendered plots are written to
    #[serde(default = "default_plot_dir")]
    pub plot_dir: PathBuf,

    /// Jaro-Winkler similarity threshold for fuzzy name search
    #[serde(default = "default_search_threshold")]
    pub search_threshold: f64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per request before a transport error is surfaced
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_plot_dir() -> PathBuf {
    PathBuf::from("plots")
}

fn default_search_threshold() -> f64 {
    0.85
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cache_dir: default_cache_dir(),
            plot_dir: default_plot_dir(),
            search_threshold: default_search_threshold(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Parse(format!("config file {}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    ///
    /// A present but malformed file is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_retries, 3);
        assert!(config.search_threshold > 0.0 && config.search_threshold <= 1.0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(r#"base_url = "http://localhost:8080/epndb""#).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/epndb");
        assert_eq!(config.cache_dir, PathBuf::from("data"));
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
