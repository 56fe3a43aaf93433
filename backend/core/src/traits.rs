use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::asset::Asset;
use crate::session::{PresignGrant, RunId, StatusReport, TriggerAck, UploadTarget};
use crate::types::ImagesResponse;

/// Body of a presign request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresignRequest {
    pub count: usize,
    pub content_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_maps_url: Option<String>,
}

/// The menu backend: issues credentials, runs extraction and serves results.
///
/// Every call is a single request/response; none of them retries.
#[async_trait]
pub trait MenuBackend: Send + Sync {
    /// Backend name for logs (e.g., "http", "scripted").
    fn name(&self) -> &str;

    /// Obtain a run id and one upload URL per asset, in request order.
    async fn presign(&self, request: &PresignRequest) -> Result<PresignGrant>;

    /// Ask the backend to start extraction. Returns once the job is accepted.
    async fn trigger_extraction(&self, run_id: &RunId) -> Result<TriggerAck>;

    /// Side-effect-free status query.
    async fn get_status(&self, run_id: &RunId) -> Result<StatusReport>;

    /// Per-dish illustrative images for an extracted run.
    async fn get_images(&self, run_id: &RunId) -> Result<ImagesResponse>;
}

/// Object storage reached through presigned URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload one asset. Success is the storage provider's own success status.
    async fn put(&self, target: &UploadTarget, asset: &Asset) -> Result<()>;
}
