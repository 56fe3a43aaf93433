use std::sync::Arc;

use tracing::{debug, info};

use menusnap_core::{is_image, Asset, IngestError, MenuBackend, PresignRequest, Stage, UploadSession};

/// The backend refuses more photos than this in one run.
pub const MAX_ASSETS_PER_RUN: usize = 10;

/// Acquires a run id and one upload URL per asset.
pub struct PresignClient {
    backend: Arc<dyn MenuBackend>,
    max_assets: usize,
    google_maps_url: Option<String>,
}

impl PresignClient {
    pub fn new(backend: Arc<dyn MenuBackend>) -> Self {
        Self {
            backend,
            max_assets: MAX_ASSETS_PER_RUN,
            google_maps_url: None,
        }
    }

    /// Lower the per-run asset limit. Never exceeds [`MAX_ASSETS_PER_RUN`].
    pub fn with_max_assets(mut self, max_assets: usize) -> Self {
        self.max_assets = max_assets.clamp(1, MAX_ASSETS_PER_RUN);
        self
    }

    pub fn with_google_maps_url(mut self, url: impl Into<String>) -> Self {
        self.google_maps_url = Some(url.into());
        self
    }

    pub fn max_assets(&self) -> usize {
        self.max_assets
    }

    /// Check the request locally so no call is made for input the backend
    /// would reject anyway.
    pub fn validate(&self, assets: &[Asset]) -> Result<(), IngestError> {
        if assets.is_empty() {
            return Err(IngestError::InvalidInput("no photos to upload".into()));
        }
        if assets.len() > self.max_assets {
            return Err(IngestError::InvalidInput(format!(
                "at most {} photos per menu, got {}",
                self.max_assets,
                assets.len()
            )));
        }
        if let Some(bad) = assets.iter().find(|a| !is_image(&a.content_type)) {
            return Err(IngestError::InvalidInput(format!(
                "{} is not an image ({})",
                bad.file_name, bad.content_type
            )));
        }
        Ok(())
    }

    /// Obtain write credentials and pair them with the assets.
    pub async fn acquire(&self, assets: Vec<Asset>) -> Result<UploadSession, IngestError> {
        self.validate(&assets)?;

        let request = PresignRequest {
            count: assets.len(),
            content_types: assets.iter().map(|a| a.content_type.clone()).collect(),
            google_maps_url: self.google_maps_url.clone(),
        };
        debug!(backend = self.backend.name(), count = request.count, "Requesting presign");

        let grant = self
            .backend
            .presign(&request)
            .await
            .map_err(|e| IngestError::request(Stage::Presign, e))?;

        let session = UploadSession::new(assets, grant)?;
        info!(run_id = %session.run_id(), assets = session.len(), "Presign granted");
        Ok(session)
    }
}
