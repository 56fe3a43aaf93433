use std::future::Future;

use tokio_util::sync::CancellationToken;

use menusnap_core::IngestError;

/// Run `fut` unless the session dies first.
///
/// Cancellation is checked before the future on every wake-up, so a
/// response that lands after the session died is dropped, never returned.
pub async fn until_cancelled<F: Future>(
    token: &CancellationToken,
    fut: F,
) -> Result<F::Output, IngestError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(IngestError::Cancelled),
        out = fut => {
            if token.is_cancelled() {
                Err(IngestError::Cancelled)
            } else {
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let out = until_cancelled(&token, async { 42 }).await;
        assert_eq!(out, Err(IngestError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn live_token_passes_output_through() {
        let token = CancellationToken::new();
        let out = until_cancelled(&token, async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            "done"
        })
        .await;
        assert_eq!(out, Ok("done"));
    }
}
