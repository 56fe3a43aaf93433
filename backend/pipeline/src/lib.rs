//! The menu ingestion pipeline.
//!
//! presign → parallel upload → trigger extraction → fixed-interval polling
//! → best-effort image fetch, sequenced by [`PipelineCoordinator`].

pub mod cancel;
pub mod coordinator;
pub mod images;
pub mod poller;
pub mod presign;
pub mod state;
pub mod trigger;
pub mod uploader;

pub use coordinator::{CompletedRun, PipelineCoordinator};
pub use images::{ImageFetcher, IMAGE_FETCH_TIMEOUT};
pub use poller::{PollPolicy, PollState, StatusPoller, MAX_POLL_ATTEMPTS, POLL_INTERVAL};
pub use presign::{PresignClient, MAX_ASSETS_PER_RUN};
pub use state::{PipelineState, SessionSnapshot};
pub use trigger::ExtractionTrigger;
pub use uploader::StorageUploader;
