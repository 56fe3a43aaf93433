use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use menusnap_client::HttpBackend;
use menusnap_config::{
    config_dir, config_file_path, load_and_prepare, redact, validate, ApiConfig, MenuSnapConfig,
};

/// Effective CLI configuration: the config file plus environment overrides.
pub struct Settings {
    pub config: MenuSnapConfig,
    pub path: PathBuf,
    pub log_dir: PathBuf,
}

impl Settings {
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let dir = config_dir();
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config_file_path(&dir));

        let config = load_and_prepare(&path).await?;
        let config = apply_env_overrides(config, |key| std::env::var(key).ok());

        let report = validate(&config);
        if let Some(first) = report.errors.first() {
            bail!("{first} (after environment overrides)");
        }

        let log_dir = config
            .log_dir()
            .cloned()
            .unwrap_or_else(|| dir.join("logs"));

        Ok(Self {
            config,
            path,
            log_dir,
        })
    }

    /// Shared HTTP client for the backend and storage uploads.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.request_timeout_secs()))
            .build()
            .context("Failed to build HTTP client")
    }

    pub fn backend(&self, client: reqwest::Client) -> HttpBackend {
        let backend = HttpBackend::new(self.config.base_url()).with_client(client);
        match self.config.auth_token() {
            Some(token) => backend.with_auth_token(token),
            None => backend,
        }
    }

    /// Print the redacted effective config as YAML.
    pub fn show(&self) -> Result<()> {
        let value = serde_json::to_value(&self.config).context("Failed to serialize config")?;
        let yaml = serde_yaml::to_string(&redact(&value)).context("Failed to render config")?;
        eprintln!("# {}", self.path.display());
        print!("{yaml}");
        Ok(())
    }
}

/// `MENUSNAP_API_URL` and `MENUSNAP_AUTH_TOKEN` win over the file.
pub fn apply_env_overrides(
    mut config: MenuSnapConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> MenuSnapConfig {
    let api = config.api.get_or_insert_with(ApiConfig::default);
    if let Some(url) = lookup("MENUSNAP_API_URL").filter(|v| !v.is_empty()) {
        api.base_url = Some(url);
    }
    if let Some(token) = lookup("MENUSNAP_AUTH_TOKEN").filter(|v| !v.is_empty()) {
        api.auth_token = Some(token);
    }
    config
}
