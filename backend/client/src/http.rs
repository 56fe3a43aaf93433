use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use menusnap_core::{
    ImagesResponse, MenuBackend, PresignGrant, PresignRequest, RunId, StatusReport, TriggerAck,
};

/// Default API endpoint for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// The menu API over JSON/HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    /// Use a preconfigured client (timeouts, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let start = Instant::now();
        let request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .json(body);

        let response = self
            .authorize(request)
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?;

        let parsed = read_json(path, response).await?;
        debug!(path, latency_ms = start.elapsed().as_millis() as u64, "API call completed");
        Ok(parsed)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let start = Instant::now();
        let request = self.client.get(format!("{}{}", self.base_url, path));

        let response = self
            .authorize(request)
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;

        let parsed = read_json(path, response).await?;
        debug!(path, latency_ms = start.elapsed().as_millis() as u64, "API call completed");
        Ok(parsed)
    }
}

#[derive(Serialize)]
struct RunRequest<'a> {
    run_id: &'a RunId,
}

/// Decode a 2xx body, or turn an error response into a readable message.
async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body: Option<serde_json::Value> = response.json().await.ok();
        let message = body
            .as_ref()
            .and_then(|b| b.get("message").or_else(|| b.get("error")))
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
        anyhow::bail!(message);
    }

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse response from {}", path))
}

#[async_trait]
impl MenuBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn presign(&self, request: &PresignRequest) -> Result<PresignGrant> {
        debug!(count = request.count, "Requesting presigned upload URLs");
        self.post_json("/uploads/presign", request).await
    }

    async fn trigger_extraction(&self, run_id: &RunId) -> Result<TriggerAck> {
        self.post_json("/menu/extract", &RunRequest { run_id }).await
    }

    async fn get_status(&self, run_id: &RunId) -> Result<StatusReport> {
        self.get_json(&format!("/menu/{}", run_id)).await
    }

    async fn get_images(&self, run_id: &RunId) -> Result<ImagesResponse> {
        self.post_json("/menu/images", &RunRequest { run_id }).await
    }
}
