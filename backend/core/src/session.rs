//! Run-scoped data exchanged with the backend: presign grants, the upload
//! session, trigger acknowledgements and status snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::error::{IngestError, Stage};
use crate::types::Menu;

/// Generic reason used when the backend reports failure without one.
pub const DEFAULT_FAILURE_REASON: &str = "Extraction failed";

/// Opaque run identifier issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Wire response of `presign`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresignGrant {
    pub run_id: RunId,
    pub upload_urls: Vec<String>,
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Write credential for a single asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub url: String,
    /// Storage key, when the backend reports one.
    pub key: Option<String>,
}

/// Assets paired index-for-index with their upload targets.
///
/// Created once presign succeeds and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct UploadSession {
    run_id: RunId,
    assets: Vec<Asset>,
    targets: Vec<UploadTarget>,
}

impl UploadSession {
    /// Pair assets with a presign grant. Fails when the grant does not carry
    /// exactly one target per asset.
    pub fn new(assets: Vec<Asset>, grant: PresignGrant) -> Result<Self, IngestError> {
        if grant.upload_urls.len() != assets.len() {
            return Err(IngestError::request(
                Stage::Presign,
                format!(
                    "backend returned {} upload targets for {} assets",
                    grant.upload_urls.len(),
                    assets.len()
                ),
            ));
        }
        let mut keys = grant.keys.into_iter();
        let targets = grant
            .upload_urls
            .into_iter()
            .map(|url| UploadTarget {
                url,
                key: keys.next(),
            })
            .collect();
        Ok(Self {
            run_id: grant.run_id,
            assets,
            targets,
        })
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn targets(&self) -> &[UploadTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Index-aligned (asset, target) pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, &Asset, &UploadTarget)> {
        self.assets
            .iter()
            .zip(self.targets.iter())
            .enumerate()
            .map(|(i, (a, t))| (i, a, t))
    }

    pub fn into_assets(self) -> Vec<Asset> {
        self.assets
    }
}

/// Wire response of `triggerExtraction`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerAck {
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub accepted: Option<bool>,
}

impl TriggerAck {
    pub fn accepted() -> Self {
        Self {
            accepted: Some(true),
            ..Default::default()
        }
    }

    /// A successful response means accepted unless it says otherwise.
    pub fn is_accepted(&self) -> bool {
        self.accepted != Some(false) && self.status.as_deref() != Some("FAILED")
    }
}

/// Wire response of `getStatus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub menu: Option<Menu>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusReport {
    pub fn pending() -> Self {
        Self {
            status: Some("PENDING".into()),
            ..Default::default()
        }
    }

    pub fn processing() -> Self {
        Self {
            status: Some("PROCESSING".into()),
            ..Default::default()
        }
    }

    pub fn extracted(menu: Menu) -> Self {
        Self {
            status: Some("EXTRACTED".into()),
            menu: Some(menu),
            ..Default::default()
        }
    }

    pub fn failed(error: Option<&str>) -> Self {
        Self {
            status: Some("FAILED".into()),
            error: error.map(String::from),
            ..Default::default()
        }
    }

    /// Interpret this snapshot.
    ///
    /// Success is `status == EXTRACTED` or a populated menu, either one.
    /// The backend could send a non-EXTRACTED status next to a menu; that is
    /// still treated as extracted until the backend contract says otherwise.
    /// An EXTRACTED status without a menu yields an empty one.
    pub fn state(self) -> ExtractionState {
        if let Some(menu) = self.menu {
            return ExtractionState::Extracted(menu);
        }
        match self.status.as_deref() {
            Some("EXTRACTED") => ExtractionState::Extracted(Menu::default()),
            Some("FAILED") => ExtractionState::Failed(
                self.error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
            ),
            _ => ExtractionState::Pending,
        }
    }
}

/// Most recently observed extraction state of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionState {
    Pending,
    Extracted(Menu),
    Failed(String),
}

impl ExtractionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExtractionState::Pending)
    }
}
