//! Config file location and loading.

use crate::schema::MenuSnapConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the menusnap config directory.
/// Priority: `MENUSNAP_CONFIG_DIR` env > `~/.menusnap/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MENUSNAP_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".menusnap"),
        None => PathBuf::from(".menusnap"),
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read and parse the config file.
///
/// A missing file is a first run and yields the empty config.
pub async fn load_config(path: &Path) -> Result<MenuSnapConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(MenuSnapConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty file parses as YAML null.
    if raw.trim().is_empty() {
        return Ok(MenuSnapConfig::default());
    }

    let config: MenuSnapConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        fs::write(&path, "api:\n  baseUrl: https://api.example\n").await.unwrap();

        let cfg = load_config(&path).await.unwrap();
        assert_eq!(cfg.base_url(), "https://api.example");
    }

    #[tokio::test]
    async fn empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        fs::write(&path, "\n").await.unwrap();
        assert!(load_config(&path).await.unwrap().api.is_none());
    }

    #[tokio::test]
    async fn malformed_yaml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        fs::write(&path, "api: [unclosed").await.unwrap();

        let err = load_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("config.yaml"));
    }
}
