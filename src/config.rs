// src/config.rs

//! Configuration loading utilities.
//!
//! The TOML file is optional; credentials and the search URL come from the
//! environment on top of it.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Load configuration from `path` and overlay the environment.
///
/// A missing file falls back to defaults. A file that exists but cannot be
/// parsed is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let config = Config::load(path)
            .map_err(|e| AppError::config(format!("{}: {e}", path.display())))?;
        log::info!("Loaded configuration from {}", path.display());
        config
    } else {
        log::info!("No config file at {}, using defaults", path.display());
        Config::default()
    };

    config.apply_env();
    Ok(config)
}

/// Load and validate configuration.
pub fn load_validated(path: &Path) -> Result<Config> {
    let config = load_config(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("harvester.toml")).unwrap();
        assert_eq!(config.source.start_page, 1);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("harvester.toml");
        std::fs::write(&path, "[source\nstart_page = ").unwrap();
        assert!(matches!(load_config(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_file_values_are_loaded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("harvester.toml");
        std::fs::write(&path, "[source]\nstart_page = 4\nmax_downloads = 10\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.source.start_page, 4);
        assert_eq!(config.source.max_downloads, Some(10));
    }
}
