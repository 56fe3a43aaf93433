use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::RunId;

/// A progress record emitted by the coordinator.
/// Every stage boundary of a session produces one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    /// Local session number; bumps on every new run, retry or cancel.
    pub session: u64,
    /// Unset until presign has issued a run id.
    pub run_id: Option<RunId>,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

/// Categories of events that can occur during a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStarted,
    /// Presign issued a run id and upload targets
    PresignIssued,
    /// Every upload of the session has settled successfully
    UploadsCompleted,
    ExtractionTriggered,
    /// One status query answered
    StatusPolled,
    ExtractionCompleted,
    ImagesFetched,
    /// Image step failed; the run still completes
    ImagesUnavailable,
    RunCompleted,
    RunFailed,
    RunCancelled,
}

impl Event {
    pub fn new(
        session: u64,
        run_id: Option<RunId>,
        kind: EventKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session,
            run_id,
            timestamp: Utc::now(),
            kind,
            payload,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}
