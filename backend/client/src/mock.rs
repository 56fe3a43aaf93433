//! Scripted in-memory stand-ins for the menu backend and object storage.
//!
//! Both record every call so tests can assert on exact request counts.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Barrier;

use menusnap_core::{
    Asset, ImagesResponse, MenuBackend, ObjectStore, PresignGrant, PresignRequest, RunId,
    StatusReport, TriggerAck, UploadTarget,
};

/// A menu backend that replays canned responses.
///
/// Status responses are consumed in order; once the script runs out every
/// further query answers PENDING.
pub struct ScriptedBackend {
    run_id: RunId,
    presign_error: Option<String>,
    target_count: Option<usize>,
    trigger_response: std::result::Result<TriggerAck, String>,
    statuses: Mutex<VecDeque<std::result::Result<StatusReport, String>>>,
    status_delay: Duration,
    images: std::result::Result<ImagesResponse, String>,
    images_delay: Duration,
    presign_calls: AtomicUsize,
    trigger_calls: AtomicUsize,
    status_calls: AtomicUsize,
    image_calls: AtomicUsize,
    presign_requests: Mutex<Vec<PresignRequest>>,
}

impl ScriptedBackend {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(run_id),
            presign_error: None,
            target_count: None,
            trigger_response: Ok(TriggerAck::accepted()),
            statuses: Mutex::new(VecDeque::new()),
            status_delay: Duration::ZERO,
            images: Ok(ImagesResponse::default()),
            images_delay: Duration::ZERO,
            presign_calls: AtomicUsize::new(0),
            trigger_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            presign_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_presign_error(mut self, message: impl Into<String>) -> Self {
        self.presign_error = Some(message.into());
        self
    }

    /// Issue this many upload targets regardless of the requested count.
    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = Some(count);
        self
    }

    pub fn with_trigger_response(mut self, ack: TriggerAck) -> Self {
        self.trigger_response = Ok(ack);
        self
    }

    pub fn with_trigger_error(mut self, message: impl Into<String>) -> Self {
        self.trigger_response = Err(message.into());
        self
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = StatusReport>) -> Self {
        {
            let mut script = lock(&self.statuses);
            script.extend(statuses.into_iter().map(Ok));
        }
        self
    }

    /// Make the next scripted status query fail at the transport level.
    pub fn with_status_error(self, message: impl Into<String>) -> Self {
        lock(&self.statuses).push_back(Err(message.into()));
        self
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub fn with_images(mut self, images: ImagesResponse) -> Self {
        self.images = Ok(images);
        self
    }

    pub fn with_images_error(mut self, message: impl Into<String>) -> Self {
        self.images = Err(message.into());
        self
    }

    pub fn with_images_delay(mut self, delay: Duration) -> Self {
        self.images_delay = delay;
        self
    }

    pub fn presign_calls(&self) -> usize {
        self.presign_calls.load(Ordering::SeqCst)
    }

    pub fn trigger_calls(&self) -> usize {
        self.trigger_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn presign_requests(&self) -> Vec<PresignRequest> {
        lock(&self.presign_requests).clone()
    }
}

#[async_trait]
impl MenuBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn presign(&self, request: &PresignRequest) -> Result<PresignGrant> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.presign_requests).push(request.clone());
        if let Some(message) = &self.presign_error {
            anyhow::bail!(message.clone());
        }
        let count = self.target_count.unwrap_or(request.count);
        Ok(PresignGrant {
            run_id: self.run_id.clone(),
            upload_urls: (0..count)
                .map(|i| format!("memory://{}/{}", self.run_id, i))
                .collect(),
            keys: (0..count).map(|i| format!("{}/{}", self.run_id, i)).collect(),
        })
    }

    async fn trigger_extraction(&self, _run_id: &RunId) -> Result<TriggerAck> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        self.trigger_response
            .clone()
            .map_err(anyhow::Error::msg)
    }

    async fn get_status(&self, _run_id: &RunId) -> Result<StatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        let next = lock(&self.statuses).pop_front();
        match next {
            Some(Ok(report)) => Ok(report),
            Some(Err(message)) => Err(anyhow::Error::msg(message)),
            None => Ok(StatusReport::pending()),
        }
    }

    async fn get_images(&self, _run_id: &RunId) -> Result<ImagesResponse> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if !self.images_delay.is_zero() {
            tokio::time::sleep(self.images_delay).await;
        }
        self.images.clone().map_err(anyhow::Error::msg)
    }
}

/// Object storage kept in memory.
///
/// Uploads to URLs ending in a failing index are rejected with the
/// configured status. An optional barrier holds every upload until all of
/// them have started, which only completes if they were dispatched
/// concurrently.
pub struct MemoryStore {
    failing: HashSet<usize>,
    failure_status: u16,
    barrier: Option<Arc<Barrier>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    puts: Mutex<Vec<(String, Asset)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            failure_status: 403,
            barrier: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            puts: Mutex::new(Vec::new()),
        }
    }

    /// Reject the upload at `index` with the given HTTP status.
    pub fn failing_at(mut self, index: usize, status: u16) -> Self {
        self.failing.insert(index);
        self.failure_status = status;
        self
    }

    /// Hold each upload until `parties` uploads are in flight together.
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Every PUT that reached the store, in arrival order.
    pub fn puts(&self) -> Vec<(String, Asset)> {
        lock(&self.puts).clone()
    }

    pub fn put_count(&self) -> usize {
        lock(&self.puts).len()
    }

    /// Highest number of uploads observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn target_index(url: &str) -> Option<usize> {
        url.rsplit('/').next().and_then(|s| s.parse().ok())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, target: &UploadTarget, asset: &Asset) -> Result<()> {
        lock(&self.puts).push((target.url.clone(), asset.clone()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match Self::target_index(&target.url) {
            Some(index) if self.failing.contains(&index) => {
                anyhow::bail!("storage returned {}", self.failure_status)
            }
            _ => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
