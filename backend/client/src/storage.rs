use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use menusnap_core::{Asset, ObjectStore, UploadTarget};

/// Uploads straight to object storage through presigned URLs.
/// No application credentials are attached; the URL carries them.
pub struct HttpObjectStore {
    client: Client,
}

impl HttpObjectStore {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, target: &UploadTarget, asset: &Asset) -> Result<()> {
        debug!(
            file = %asset.file_name,
            mime = %asset.content_type,
            size = asset.len(),
            "Uploading asset"
        );

        let response = self
            .client
            .put(&target.url)
            .header("Content-Type", &asset.content_type)
            .body(asset.bytes.clone())
            .send()
            .await
            .with_context(|| format!("Upload of {} failed", asset.file_name))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("storage returned {}", status.as_u16());
        }
        Ok(())
    }
}
