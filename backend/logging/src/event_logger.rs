//! Pipeline Event Logger
//!
//! Writes coordinator events (stage boundaries, failures) to the structured
//! log under the `pipeline_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use menusnap_core::{Event, EventKind};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session: u64,
    pub run_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    /// Redacted JSON payload.
    pub payload: String,
}

impl From<&Event> for EventLogEntry {
    fn from(event: &Event) -> Self {
        Self {
            session: event.session,
            run_id: event.run_id.as_ref().map(|r| r.to_string()),
            timestamp: event.timestamp,
            kind: event.kind.clone(),
            payload: redact_sensitive_data(&event.payload.to_string()),
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Log a pipeline event. Failures and degraded steps are logged at WARN.
    pub fn log_event(event: &Event) -> EventLogEntry {
        let entry = EventLogEntry::from(event);
        let run_id = entry.run_id.as_deref().unwrap_or("-");

        match entry.kind {
            EventKind::RunFailed | EventKind::ImagesUnavailable => warn!(
                target: "pipeline_events",
                session = entry.session,
                run_id,
                kind = %entry.kind,
                payload = %entry.payload,
                "Pipeline event"
            ),
            _ => info!(
                target: "pipeline_events",
                session = entry.session,
                run_id,
                kind = %entry.kind,
                payload = %entry.payload,
                "Pipeline event"
            ),
        }
        entry
    }
}
