//! Sequences one ingestion session through the pipeline and publishes its
//! state.
//!
//! Each run gets a session number and a cancellation token. Every state
//! transition is applied under the `live` lock and only if the session is
//! still the live one, so a late response from a cancelled or superseded
//! session can never touch the state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use menusnap_core::{
    Asset, DishImageSet, Event, EventKind, IngestError, Menu, MenuBackend, ObjectStore,
    RunId,
};
use menusnap_logging::EventLogger;

use crate::cancel::until_cancelled;
use crate::images::ImageFetcher;
use crate::poller::{PollPolicy, StatusPoller};
use crate::presign::PresignClient;
use crate::state::{PipelineState, SessionSnapshot};
use crate::trigger::ExtractionTrigger;
use crate::uploader::StorageUploader;

/// What a successful run hands over to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRun {
    pub run_id: RunId,
    pub menu: Menu,
    pub images: DishImageSet,
}

#[derive(Default)]
struct Live {
    session: u64,
    /// Present while a session is driving the pipeline.
    token: Option<CancellationToken>,
    last_assets: Vec<Asset>,
}

pub struct PipelineCoordinator {
    presign: PresignClient,
    uploader: StorageUploader,
    trigger: ExtractionTrigger,
    poller: StatusPoller,
    images: ImageFetcher,
    state_tx: watch::Sender<SessionSnapshot>,
    live: Mutex<Live>,
    events: Option<mpsc::Sender<Event>>,
}

impl PipelineCoordinator {
    pub fn new(backend: Arc<dyn MenuBackend>, store: Arc<dyn ObjectStore>) -> Self {
        let (state_tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            presign: PresignClient::new(backend.clone()),
            uploader: StorageUploader::new(store),
            trigger: ExtractionTrigger::new(backend.clone()),
            poller: StatusPoller::new(backend.clone()),
            images: ImageFetcher::new(backend),
            state_tx,
            live: Mutex::new(Live::default()),
            events: None,
        }
    }

    pub fn with_max_assets(mut self, max_assets: usize) -> Self {
        self.presign = self.presign.with_max_assets(max_assets);
        self
    }

    pub fn with_google_maps_url(mut self, url: impl Into<String>) -> Self {
        self.presign = self.presign.with_google_maps_url(url);
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poller = self.poller.with_policy(policy);
        self
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.images = self.images.with_timeout(timeout);
        self
    }

    /// Forward every event to `tx`. Events are dropped when the receiver
    /// falls behind; the watch channel stays authoritative.
    pub fn with_event_sink(mut self, tx: mpsc::Sender<Event>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.state_tx.borrow().state.clone()
    }

    /// Run the whole pipeline for `assets`.
    ///
    /// Supersedes any live session. Input the backend would refuse is
    /// rejected before anything else happens, leaving the current state
    /// untouched. Returns `Cancelled` if the session was cancelled or
    /// superseded before it settled.
    pub async fn run(&self, assets: Vec<Asset>) -> Result<CompletedRun, IngestError> {
        self.presign.validate(&assets)?;

        let (session, token) = self.begin(&assets);
        self.emit(session, None, EventKind::SessionStarted, json!({ "assets": assets.len() }));

        let mut run_id = None;
        let outcome = self.drive(session, &token, assets, &mut run_id).await;
        self.finish(session, &token, run_id, outcome)
    }

    /// Restart the last failed run with its assets and a fresh presign.
    pub async fn retry(&self) -> Result<CompletedRun, IngestError> {
        if !matches!(self.state(), PipelineState::Error { .. }) {
            return Err(IngestError::InvalidInput("only a failed run can be retried".into()));
        }
        let assets = self.lock_live().last_assets.clone();
        info!(assets = assets.len(), "Retrying failed run");
        self.run(assets).await
    }

    /// Mark the live session dead and return to IDLE.
    ///
    /// Returns false when no session was running.
    pub fn cancel(&self) -> bool {
        let mut live = self.lock_live();
        let Some(token) = live.token.take() else {
            return false;
        };
        token.cancel();

        let cancelled = live.session;
        let run_id = self.state_tx.borrow().state.run_id().cloned();
        live.session += 1;
        self.state_tx.send_replace(SessionSnapshot {
            session: live.session,
            state: PipelineState::Idle,
        });
        drop(live);

        info!(session = cancelled, "Session cancelled");
        self.emit(cancelled, run_id.as_ref(), EventKind::RunCancelled, json!({}));
        true
    }

    fn begin(&self, assets: &[Asset]) -> (u64, CancellationToken) {
        let mut live = self.lock_live();
        if let Some(previous) = live.token.take() {
            debug!(session = live.session, "Superseding live session");
            previous.cancel();
        }
        live.session += 1;
        let token = CancellationToken::new();
        live.token = Some(token.clone());
        live.last_assets = assets.to_vec();

        self.state_tx.send_replace(SessionSnapshot {
            session: live.session,
            state: PipelineState::Uploading {
                asset_count: assets.len(),
            },
        });
        (live.session, token)
    }

    async fn drive(
        &self,
        session: u64,
        token: &CancellationToken,
        assets: Vec<Asset>,
        run_id: &mut Option<RunId>,
    ) -> Result<CompletedRun, IngestError> {
        let upload = until_cancelled(token, self.presign.acquire(assets)).await??;
        let id = upload.run_id().clone();
        *run_id = Some(id.clone());
        self.emit(session, Some(&id), EventKind::PresignIssued, json!({ "targets": upload.len() }));

        until_cancelled(token, self.uploader.upload_all(&upload)).await??;
        self.emit(session, Some(&id), EventKind::UploadsCompleted, json!({ "count": upload.len() }));

        let max_attempts = self.poller.policy().max_attempts;
        self.advance(
            session,
            token,
            PipelineState::Extracting {
                run_id: id.clone(),
                attempt: 0,
                max_attempts,
            },
        )?;

        let ack = until_cancelled(token, self.trigger.trigger(&id)).await??;
        self.emit(session, Some(&id), EventKind::ExtractionTriggered, json!({ "status": ack.status }));

        let menu = self
            .poller
            .poll(&id, token, |attempt| {
                let progressed = self.advance(
                    session,
                    token,
                    PipelineState::Extracting {
                        run_id: id.clone(),
                        attempt,
                        max_attempts,
                    },
                );
                if progressed.is_ok() {
                    self.emit(session, Some(&id), EventKind::StatusPolled, json!({ "attempt": attempt }));
                }
            })
            .await?;
        self.emit(
            session,
            Some(&id),
            EventKind::ExtractionCompleted,
            json!({ "dishes": menu.dish_count() }),
        );

        self.advance(session, token, PipelineState::AwaitingImages { run_id: id.clone() })?;
        let images = match until_cancelled(token, self.images.fetch(&id)).await? {
            Ok(images) => {
                self.emit(session, Some(&id), EventKind::ImagesFetched, json!({ "dishes": images.len() }));
                images
            }
            Err(e) => {
                warn!(run_id = %id, error = %e, "Continuing without dish images");
                self.emit(session, Some(&id), EventKind::ImagesUnavailable, json!({ "error": e.to_string() }));
                DishImageSet::default()
            }
        };

        Ok(CompletedRun {
            run_id: id,
            menu,
            images,
        })
    }

    fn finish(
        &self,
        session: u64,
        token: &CancellationToken,
        run_id: Option<RunId>,
        outcome: Result<CompletedRun, IngestError>,
    ) -> Result<CompletedRun, IngestError> {
        match outcome {
            Ok(done) => {
                let state = PipelineState::Complete {
                    run_id: done.run_id.clone(),
                    menu: done.menu.clone(),
                    images: done.images.clone(),
                };
                if !self.settle(session, token, state) {
                    return Err(IngestError::Cancelled);
                }
                info!(run_id = %done.run_id, dishes = done.menu.dish_count(), "Run complete");
                self.emit(session, Some(&done.run_id), EventKind::RunCompleted, json!({}));
                Ok(done)
            }
            Err(IngestError::Cancelled) => Err(IngestError::Cancelled),
            Err(err) => {
                if !self.settle(session, token, PipelineState::error(run_id.clone(), &err)) {
                    return Err(IngestError::Cancelled);
                }
                warn!(run_id = ?run_id, error = %err, "Run failed");
                self.emit(
                    session,
                    run_id.as_ref(),
                    EventKind::RunFailed,
                    json!({ "kind": err.kind(), "message": err.user_message() }),
                );
                Err(err)
            }
        }
    }

    /// Publish `state` if `session` is still live.
    fn advance(
        &self,
        session: u64,
        token: &CancellationToken,
        state: PipelineState,
    ) -> Result<(), IngestError> {
        let live = self.lock_live();
        if live.session != session || token.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        self.state_tx.send_replace(SessionSnapshot { session, state });
        Ok(())
    }

    /// Publish a terminal state and release the session.
    fn settle(&self, session: u64, token: &CancellationToken, state: PipelineState) -> bool {
        let mut live = self.lock_live();
        if live.session != session || token.is_cancelled() {
            return false;
        }
        live.token = None;
        self.state_tx.send_replace(SessionSnapshot { session, state });
        true
    }

    fn emit(&self, session: u64, run_id: Option<&RunId>, kind: EventKind, payload: serde_json::Value) {
        let event = Event::new(session, run_id.cloned(), kind, payload);
        EventLogger::log_event(&event);
        if let Some(tx) = &self.events {
            if tx.try_send(event).is_err() {
                debug!(session, "Event sink full or closed, event dropped");
            }
        }
    }

    fn lock_live(&self) -> MutexGuard<'_, Live> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
