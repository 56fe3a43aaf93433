//! `menusnap-config`: runtime configuration for the menusnap client.
//!
//! Provides:
//! - Typed config schema (backend API, upload limits, logging)
//! - YAML loading from the config directory
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with warnings and errors
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config};
pub use redact::redact;
pub use schema::{ApiConfig, LoggingConfig, MenuSnapConfig, UploadConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load a config file, substitute env vars, apply defaults and validate.
///
/// Warnings are logged. Any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<MenuSnapConfig> {
    let raw = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config: MenuSnapConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!(
            "{} invalid config value(s) in {}; first: {}",
            report.errors.len(),
            path.display(),
            report.errors[0]
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_and_prepare(&dir.path().join("config.yaml")).await.unwrap();
        assert_eq!(config.base_url(), defaults::DEFAULT_BASE_URL);
        assert_eq!(config.max_assets(), defaults::DEFAULT_MAX_ASSETS);
    }

    #[tokio::test]
    async fn invalid_values_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "upload:\n  maxAssets: 25\n").await.unwrap();

        let err = load_and_prepare(&path).await.unwrap_err();
        assert!(err.to_string().contains("upload.maxAssets"));
    }
}
