//! Application configuration
//!
//! Loaded from a YAML file; every field has a default so a missing or
//! partial file is fine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::DEFAULT_MAX_LOG_LINES;
use crate::path_validation::PathValidator;

/// Config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "photosync.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Directory holding the persisted definition tables
    pub store_dir: PathBuf,
    pub max_log_lines: usize,
    /// Accept `/absolute/paths` in addition to drive and UNC paths
    pub allow_posix_paths: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".photosync"),
            max_log_lines: DEFAULT_MAX_LOG_LINES,
            allow_posix_paths: cfg!(unix),
        }
    }
}

impl AppConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn path_validator(&self) -> PathValidator {
        PathValidator::new().with_posix_paths(self.allow_posix_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "storeDir: /var/lib/photosync\nallowPosixPaths: false\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/var/lib/photosync"));
        assert!(!config.allow_posix_paths);
        assert_eq!(config.max_log_lines, DEFAULT_MAX_LOG_LINES);
        assert!(!config.path_validator().accepts_posix_paths());
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "maxLogLines: [not a number\n").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }
}
