pub mod asset;
pub mod error;
pub mod event;
pub mod session;
pub mod traits;
pub mod types;

pub use asset::{collect_image_assets, detect_mime_type, is_image, storage_extension, Asset};
pub use error::{ErrorKind, IngestError, Stage, UploadFailure};
pub use event::{Event, EventKind};
pub use session::{
    ExtractionState, PresignGrant, RunId, StatusReport, TriggerAck, UploadSession, UploadTarget,
};
pub use traits::{MenuBackend, ObjectStore, PresignRequest};
pub use types::{Dish, DishImageSet, DishImages, ImagesResponse, Menu, MenuSection};
