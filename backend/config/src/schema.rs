//! menusnap configuration schema.
//!
//! Every field is optional on disk; [`crate::defaults`] fills the gaps and
//! the accessors on [`MenuSnapConfig`] read the effective values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::defaults::{
    DEFAULT_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_MAX_ASSETS, DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// Root configuration, read from `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSnapConfig {
    /// Menu backend connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    /// Photo upload settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sent as `Authorization: Bearer <token>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_assets: Option<usize>,
    /// Restaurant listing forwarded with every presign request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Console output as JSON instead of plain text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl MenuSnapConfig {
    pub fn base_url(&self) -> &str {
        self.api
            .as_ref()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.api
            .as_ref()
            .and_then(|a| a.auth_token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.api
            .as_ref()
            .and_then(|a| a.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn max_assets(&self) -> usize {
        self.upload
            .as_ref()
            .and_then(|u| u.max_assets)
            .unwrap_or(DEFAULT_MAX_ASSETS)
    }

    pub fn google_maps_url(&self) -> Option<&str> {
        self.upload.as_ref().and_then(|u| u.google_maps_url.as_deref())
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&PathBuf> {
        self.logging.as_ref().and_then(|l| l.dir.as_ref())
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
api:
  baseUrl: https://api.menusnap.app
  authToken: tok
  requestTimeoutSecs: 10
upload:
  maxAssets: 4
  googleMapsUrl: https://maps.google.com/?cid=1
logging:
  level: debug
  json: true
"#;
        let cfg: MenuSnapConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.base_url(), "https://api.menusnap.app");
        assert_eq!(cfg.auth_token(), Some("tok"));
        assert_eq!(cfg.request_timeout_secs(), 10);
        assert_eq!(cfg.max_assets(), 4);
        assert_eq!(cfg.google_maps_url(), Some("https://maps.google.com/?cid=1"));
        assert_eq!(cfg.log_level(), "debug");
        assert!(cfg.log_json());
    }

    #[test]
    fn empty_token_counts_as_unset() {
        let cfg = MenuSnapConfig {
            api: Some(ApiConfig {
                auth_token: Some(String::new()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(cfg.auth_token(), None);
    }
}
