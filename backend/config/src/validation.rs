//! Config validation with path-qualified messages.

use crate::schema::MenuSnapConfig;
use thiserror::Error;

/// Highest photo count the backend accepts in one run.
const BACKEND_MAX_ASSETS: usize = 10;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &MenuSnapConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_api(config, &mut report);
    validate_upload(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_api(config: &MenuSnapConfig, report: &mut ValidationReport) {
    let Some(api) = &config.api else { return };
    if let Some(url) = &api.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("api.baseUrl", format!("'{url}' must start with http:// or https://"));
        }
    }
    if api.request_timeout_secs == Some(0) {
        report.error("api.requestTimeoutSecs", "requestTimeoutSecs must be > 0");
    }
}

fn validate_upload(config: &MenuSnapConfig, report: &mut ValidationReport) {
    let Some(upload) = &config.upload else { return };
    if let Some(max) = upload.max_assets {
        if !(1..=BACKEND_MAX_ASSETS).contains(&max) {
            report.error(
                "upload.maxAssets",
                format!("maxAssets must be between 1 and {BACKEND_MAX_ASSETS}, got {max}"),
            );
        }
    }
    if let Some(url) = &upload.google_maps_url {
        if !url.starts_with("https://") {
            report.warn("upload.googleMapsUrl", "googleMapsUrl does not look like a URL");
        }
    }
}

fn validate_logging(config: &MenuSnapConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            report.warn(
                "logging.level",
                format!("Unknown log level '{level}'; falling back to RUST_LOG or info"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{ApiConfig, LoggingConfig, UploadConfig};

    #[test]
    fn defaults_are_valid() {
        let report = validate(&apply_all_defaults(MenuSnapConfig::default()));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn rejects_non_http_base_url_and_zero_timeout() {
        let cfg = MenuSnapConfig {
            api: Some(ApiConfig {
                base_url: Some("localhost:3001".into()),
                request_timeout_secs: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["api.baseUrl", "api.requestTimeoutSecs"]);
    }

    #[test]
    fn max_assets_must_stay_within_backend_limit() {
        for bad in [0, 11] {
            let cfg = MenuSnapConfig {
                upload: Some(UploadConfig {
                    max_assets: Some(bad),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(!validate(&cfg).is_valid(), "maxAssets {bad}");
        }
    }

    #[test]
    fn unknown_log_level_is_only_a_warning() {
        let cfg = MenuSnapConfig {
            logging: Some(LoggingConfig {
                level: Some("chatty".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "logging.level");
    }
}
