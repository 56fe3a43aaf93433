//! Config defaults: fills unset values after parsing.

use crate::schema::{ApiConfig, LoggingConfig, MenuSnapConfig, UploadConfig};

/// Local development backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Matches the backend's per-run photo limit.
pub const DEFAULT_MAX_ASSETS: usize = 10;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: MenuSnapConfig) -> MenuSnapConfig {
    let config = apply_api_defaults(config);
    let config = apply_upload_defaults(config);
    apply_logging_defaults(config)
}

fn apply_api_defaults(mut config: MenuSnapConfig) -> MenuSnapConfig {
    let api = config.api.get_or_insert_with(ApiConfig::default);
    if api.base_url.is_none() {
        api.base_url = Some(DEFAULT_BASE_URL.to_string());
    }
    if api.request_timeout_secs.is_none() {
        api.request_timeout_secs = Some(DEFAULT_REQUEST_TIMEOUT_SECS);
    }
    config
}

fn apply_upload_defaults(mut config: MenuSnapConfig) -> MenuSnapConfig {
    let upload = config.upload.get_or_insert_with(UploadConfig::default);
    if upload.max_assets.is_none() {
        upload.max_assets = Some(DEFAULT_MAX_ASSETS);
    }
    config
}

/// The log directory is resolved later, against the config directory.
fn apply_logging_defaults(mut config: MenuSnapConfig) -> MenuSnapConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.json.is_none() {
        logging.json = Some(false);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(MenuSnapConfig::default());
        let api = cfg.api.as_ref().unwrap();
        assert_eq!(api.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(api.request_timeout_secs, Some(30));
        assert_eq!(cfg.upload.as_ref().unwrap().max_assets, Some(10));
        assert_eq!(cfg.logging.as_ref().unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn does_not_override_user_values() {
        let cfg = MenuSnapConfig {
            upload: Some(UploadConfig {
                max_assets: Some(3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.max_assets(), 3);
    }
}
