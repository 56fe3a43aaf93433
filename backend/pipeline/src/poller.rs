//! Fixed-interval status polling.
//!
//! Every query is preceded by the same delay; there is no backoff. The
//! attempt budget times the interval is the client-side timeout ceiling.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use menusnap_core::{ExtractionState, IngestError, Menu, MenuBackend, RunId, Stage, StatusReport};

use crate::cancel::until_cancelled;

/// Delay before every status query.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Status queries issued before the run is declared timed out.
pub const MAX_POLL_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Longest a run can stay pending before timing out.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Client-side view of a polled run.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Pending { attempts: u32 },
    Extracted(Menu),
    Failed(String),
    TimedOut { attempts: u32 },
}

impl PollState {
    pub fn start() -> Self {
        PollState::Pending { attempts: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending { .. })
    }

    /// Fold one status response into the state.
    ///
    /// Terminal states absorb further responses.
    pub fn observe(self, report: StatusReport, max_attempts: u32) -> PollState {
        let PollState::Pending { attempts } = self else {
            return self;
        };
        let attempts = attempts + 1;
        match report.state() {
            ExtractionState::Extracted(menu) => PollState::Extracted(menu),
            ExtractionState::Failed(reason) => PollState::Failed(reason),
            ExtractionState::Pending if attempts >= max_attempts => PollState::TimedOut { attempts },
            ExtractionState::Pending => PollState::Pending { attempts },
        }
    }
}

/// Polls a run until it is extracted, fails, or runs out of attempts.
/// At most one status request is outstanding at any time.
pub struct StatusPoller {
    backend: Arc<dyn MenuBackend>,
    policy: PollPolicy,
}

impl StatusPoller {
    pub fn new(backend: Arc<dyn MenuBackend>) -> Self {
        Self {
            backend,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Poll `run_id` to a terminal state.
    ///
    /// `on_attempt` is called with the attempt number after every response.
    /// A failed status request ends polling with a request error.
    pub async fn poll(
        &self,
        run_id: &RunId,
        cancel: &CancellationToken,
        mut on_attempt: impl FnMut(u32) + Send,
    ) -> Result<Menu, IngestError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut state = PollState::start();

        loop {
            match state {
                PollState::Pending { attempts } => {
                    until_cancelled(cancel, tokio::time::sleep(self.policy.interval)).await?;

                    let report = until_cancelled(cancel, self.backend.get_status(run_id))
                        .await?
                        .map_err(|e| IngestError::request(Stage::Status, e))?;

                    debug!(run_id = %run_id, attempt = attempts + 1, status = ?report.status, "Status polled");
                    state = PollState::Pending { attempts }.observe(report, max_attempts);
                    on_attempt(attempts + 1);
                }
                PollState::Extracted(menu) => {
                    info!(run_id = %run_id, dishes = menu.dish_count(), "Menu extracted");
                    return Ok(menu);
                }
                PollState::Failed(reason) => {
                    warn!(run_id = %run_id, reason = %reason, "Extraction failed");
                    return Err(IngestError::ExtractionFailed { reason });
                }
                PollState::TimedOut { attempts } => {
                    warn!(run_id = %run_id, attempts, "Extraction timed out");
                    return Err(IngestError::Timeout { attempts });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menusnap_client::ScriptedBackend;
    use menusnap_core::{Dish, MenuSection};
    use tokio::time::Instant;

    fn menu() -> Menu {
        Menu {
            restaurant_name: Some("Taqueria".into()),
            sections: vec![MenuSection {
                name: "Tacos".into(),
                dishes: vec![Dish::new("Al Pastor").with_price(4.5)],
            }],
        }
    }

    fn poller(backend: &Arc<ScriptedBackend>) -> StatusPoller {
        StatusPoller::new(backend.clone())
    }

    #[test]
    fn observe_counts_attempts_and_times_out() {
        let state = PollState::start().observe(StatusReport::pending(), 2);
        assert_eq!(state, PollState::Pending { attempts: 1 });
        let state = state.observe(StatusReport::processing(), 2);
        assert_eq!(state, PollState::TimedOut { attempts: 2 });
    }

    #[test]
    fn terminal_states_absorb_responses() {
        let failed = PollState::Failed("bad".into());
        assert_eq!(
            failed.clone().observe(StatusReport::extracted(menu()), 5),
            failed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_extracted_response() {
        let backend = Arc::new(ScriptedBackend::new("r1").with_statuses([
            StatusReport::pending(),
            StatusReport::processing(),
            StatusReport::extracted(menu()),
            StatusReport::pending(),
        ]));
        let mut seen = Vec::new();
        let start = Instant::now();

        let got = poller(&backend)
            .poll(&RunId::new("r1"), &CancellationToken::new(), |a| seen.push(a))
            .await
            .unwrap();

        assert_eq!(got, menu());
        assert_eq!(backend.status_calls(), 3);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(start.elapsed(), POLL_INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn menu_with_pending_status_counts_as_extracted() {
        let quirky = StatusReport {
            status: Some("PENDING".into()),
            menu: Some(menu()),
            ..Default::default()
        };
        let backend = Arc::new(ScriptedBackend::new("r1").with_statuses([quirky]));
        let got = poller(&backend)
            .poll(&RunId::new("r1"), &CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(got.dish_names(), vec!["Al Pastor"]);
        assert_eq!(backend.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn extracted_status_without_menu_stops_polling() {
        let status_only = StatusReport {
            status: Some("EXTRACTED".into()),
            ..Default::default()
        };
        let backend = Arc::new(
            ScriptedBackend::new("r1").with_statuses([StatusReport::pending(), status_only]),
        );
        let got = poller(&backend)
            .poll(&RunId::new("r1"), &CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(got, Menu::default());
        assert_eq!(backend.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_surfaces_without_waiting_for_more_attempts() {
        let backend = Arc::new(ScriptedBackend::new("r1").with_statuses([
            StatusReport::pending(),
            StatusReport::failed(Some("Could not read the menu")),
        ]));
        let err = poller(&backend)
            .poll(&RunId::new("r1"), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(
            err,
            IngestError::ExtractionFailed { reason: "Could not read the menu".into() }
        );
        assert_eq!(backend.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_for_whole_budget_times_out_after_exact_attempts() {
        let backend = Arc::new(ScriptedBackend::new("r1"));
        let start = Instant::now();
        let err = poller(&backend)
            .poll(&RunId::new("r1"), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err, IngestError::Timeout { attempts: MAX_POLL_ATTEMPTS });
        assert_eq!(backend.status_calls(), MAX_POLL_ATTEMPTS as usize);
        assert_eq!(start.elapsed(), PollPolicy::default().ceiling());
    }

    #[tokio::test(start_paused = true)]
    async fn status_request_failure_is_terminal() {
        let backend = Arc::new(
            ScriptedBackend::new("r1")
                .with_statuses([StatusReport::pending()])
                .with_status_error("API error: 502"),
        );
        let err = poller(&backend)
            .poll(&RunId::new("r1"), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, IngestError::request(Stage::Status, "API error: 502"));
        assert_eq!(backend.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let backend = Arc::new(ScriptedBackend::new("r1"));
        let token = CancellationToken::new();
        let canceller = token.clone();
        let policy = PollPolicy { interval: Duration::from_millis(500), max_attempts: 10 };

        let err = StatusPoller::new(backend.clone())
            .with_policy(policy)
            .poll(&RunId::new("r1"), &token, move |attempt| {
                if attempt == 3 {
                    canceller.cancel();
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err, IngestError::Cancelled);
        assert_eq!(backend.status_calls(), 3);
    }
}
