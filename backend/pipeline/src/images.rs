use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use menusnap_core::{DishImageSet, IngestError, MenuBackend, RunId};

/// Upper bound on the single dish-image request.
pub const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the dish-name to image-URL mapping once a menu is extracted.
///
/// Images are optional; the coordinator treats any error here as non-fatal.
pub struct ImageFetcher {
    backend: Arc<dyn MenuBackend>,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(backend: Arc<dyn MenuBackend>) -> Self {
        Self {
            backend,
            timeout: IMAGE_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch(&self, run_id: &RunId) -> Result<DishImageSet, IngestError> {
        let response = tokio::time::timeout(self.timeout, self.backend.get_images(run_id))
            .await
            .map_err(|_| {
                IngestError::ImageFetch(format!("no response within {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| IngestError::ImageFetch(e.to_string()))?;

        let images = DishImageSet::from(response);
        debug!(run_id = %run_id, dishes = images.len(), "Dish images fetched");
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menusnap_client::ScriptedBackend;
    use menusnap_core::{DishImages, ImagesResponse};

    fn response() -> ImagesResponse {
        ImagesResponse {
            dishes: vec![DishImages {
                name: "Al Pastor".into(),
                images: vec!["https://img/1.jpg".into()],
            }],
        }
    }

    #[tokio::test]
    async fn maps_images_by_dish_name() {
        let backend = Arc::new(ScriptedBackend::new("r1").with_images(response()));
        let images = ImageFetcher::new(backend).fetch(&RunId::new("r1")).await.unwrap();
        assert_eq!(images.images_for("al pastor"), ["https://img/1.jpg".to_string()]);
        assert!(images.images_for("Carnitas").is_empty());
    }

    #[tokio::test]
    async fn backend_error_is_non_fatal_image_error() {
        let backend = Arc::new(ScriptedBackend::new("r1").with_images_error("API error: 500"));
        let fetcher = ImageFetcher::new(backend.clone());

        let err = fetcher.fetch(&RunId::new("r1")).await.unwrap_err();
        assert_eq!(err, IngestError::ImageFetch("API error: 500".into()));
        assert!(!err.is_terminal());
        assert_eq!(backend.image_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let backend = Arc::new(
            ScriptedBackend::new("r1")
                .with_images(response())
                .with_images_delay(IMAGE_FETCH_TIMEOUT * 2),
        );
        let err = ImageFetcher::new(backend).fetch(&RunId::new("r1")).await.unwrap_err();
        assert!(matches!(err, IngestError::ImageFetch(_)));
    }
}
