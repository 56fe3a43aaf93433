use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, warn};

use menusnap_core::{IngestError, ObjectStore, UploadFailure, UploadSession};
use menusnap_logging::redact_sensitive_data;

/// Pushes every asset of a session to storage at once.
pub struct StorageUploader {
    store: Arc<dyn ObjectStore>,
}

impl StorageUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Dispatch all uploads together and wait for every one to settle.
    ///
    /// Succeeds only if all of them succeeded; otherwise reports each failed
    /// index. There is no partial-success path.
    pub async fn upload_all(&self, session: &UploadSession) -> Result<(), IngestError> {
        let start = Instant::now();
        info!(run_id = %session.run_id(), count = session.len(), "Uploading assets");

        let uploads = session.pairs().map(|(index, asset, target)| {
            let store = Arc::clone(&self.store);
            async move {
                debug!(index, url = %redact_sensitive_data(&target.url), "Upload dispatched");
                (index, store.put(target, asset).await)
            }
        });

        let failures: Vec<UploadFailure> = join_all(uploads)
            .await
            .into_iter()
            .filter_map(|(index, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    let reason = redact_sensitive_data(&e.to_string());
                    warn!(run_id = %session.run_id(), index, error = %reason, "Upload failed");
                    Some(UploadFailure { index, reason })
                }
            })
            .collect();

        if !failures.is_empty() {
            return Err(IngestError::PartialUpload { failures });
        }

        info!(
            run_id = %session.run_id(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "All uploads settled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bytes::Bytes;
    use menusnap_client::MemoryStore;
    use menusnap_core::{Asset, PresignGrant};

    fn session(n: usize) -> UploadSession {
        let assets = (0..n)
            .map(|i| Asset::new(format!("p{i}.png"), "image/png", Bytes::from(vec![i as u8; 4])))
            .collect();
        let grant = PresignGrant {
            run_id: "r1".into(),
            upload_urls: (0..n).map(|i| format!("memory://r1/{i}")).collect(),
            keys: vec![],
        };
        UploadSession::new(assets, grant).unwrap()
    }

    #[tokio::test]
    async fn uploads_are_dispatched_concurrently() {
        // Each put blocks until all four are in flight; sequential dispatch
        // would never get past the first one.
        let store = Arc::new(MemoryStore::new().with_barrier(4));
        let uploader = StorageUploader::new(store.clone());

        tokio::time::timeout(Duration::from_secs(5), uploader.upload_all(&session(4)))
            .await
            .expect("uploads were serialized")
            .unwrap();

        assert_eq!(store.put_count(), 4);
        assert_eq!(store.max_in_flight(), 4);
    }

    #[tokio::test]
    async fn each_asset_goes_to_its_own_target() {
        let store = Arc::new(MemoryStore::new());
        StorageUploader::new(store.clone())
            .upload_all(&session(3))
            .await
            .unwrap();

        let mut puts = store.puts();
        puts.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(puts[2].0, "memory://r1/2");
        assert_eq!(puts[2].1.file_name, "p2.png");
    }

    #[tokio::test]
    async fn one_failure_fails_the_whole_step() {
        let store = Arc::new(MemoryStore::new().failing_at(1, 403));
        let err = StorageUploader::new(store.clone())
            .upload_all(&session(3))
            .await
            .unwrap_err();

        match err {
            IngestError::PartialUpload { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
                assert!(failures[0].reason.contains("403"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The other uploads still ran to completion.
        assert_eq!(store.put_count(), 3);
    }
}
