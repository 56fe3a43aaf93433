use std::sync::Arc;

use tracing::info;

use menusnap_core::{IngestError, MenuBackend, RunId, Stage, TriggerAck};

/// Asks the backend to start extraction for a run. Returns as soon as the
/// job is accepted; completion is observed by the poller.
pub struct ExtractionTrigger {
    backend: Arc<dyn MenuBackend>,
}

impl ExtractionTrigger {
    pub fn new(backend: Arc<dyn MenuBackend>) -> Self {
        Self { backend }
    }

    pub async fn trigger(&self, run_id: &RunId) -> Result<TriggerAck, IngestError> {
        let ack = self
            .backend
            .trigger_extraction(run_id)
            .await
            .map_err(|e| IngestError::request(Stage::Trigger, e))?;

        if !ack.is_accepted() {
            return Err(IngestError::request(
                Stage::Trigger,
                "extraction was not accepted",
            ));
        }

        info!(run_id = %run_id, status = ?ack.status, "Extraction accepted");
        Ok(ack)
    }
}
