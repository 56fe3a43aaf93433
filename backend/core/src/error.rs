use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The single-call boundary a request failure happened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Presign,
    Upload,
    Trigger,
    Status,
    Images,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Presign => "presign",
            Stage::Upload => "upload",
            Stage::Trigger => "trigger",
            Stage::Status => "status",
            Stage::Images => "images",
        };
        f.write_str(s)
    }
}

/// One failed upload out of a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    /// Position of the asset in the session, aligned with its upload target.
    pub index: usize,
    pub reason: String,
}

/// Errors surfaced by the ingestion pipeline.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IngestError {
    #[error("{stage} request failed: {message}")]
    Request { stage: Stage, message: String },

    #[error("{} of the uploads failed (indices {})", failures.len(), format_indices(failures))]
    PartialUpload { failures: Vec<UploadFailure> },

    #[error("extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    #[error("extraction timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// Non-fatal; logged by the image step and never stored as a pipeline failure.
    #[error("image fetch failed: {0}")]
    ImageFetch(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session cancelled")]
    Cancelled,
}

/// Flat tag for [`IngestError`], convenient for UI state and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Request,
    PartialUpload,
    ExtractionFailed,
    Timeout,
    ImageFetch,
    InvalidInput,
    Cancelled,
}

impl IngestError {
    pub fn request(stage: Stage, err: impl fmt::Display) -> Self {
        Self::Request {
            stage,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Request { .. } => ErrorKind::Request,
            IngestError::PartialUpload { .. } => ErrorKind::PartialUpload,
            IngestError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            IngestError::Timeout { .. } => ErrorKind::Timeout,
            IngestError::ImageFetch(_) => ErrorKind::ImageFetch,
            IngestError::InvalidInput(_) => ErrorKind::InvalidInput,
            IngestError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether this error ends the pipeline in ERROR.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, IngestError::ImageFetch(_))
    }

    /// Text shown to the user when the pipeline lands in ERROR.
    pub fn user_message(&self) -> String {
        match self {
            IngestError::Request { message, .. } => message.clone(),
            IngestError::PartialUpload { failures } if failures.len() == 1 => {
                format!("Photo {} failed to upload", failures[0].index + 1)
            }
            IngestError::PartialUpload { failures } => {
                format!("{} photos failed to upload", failures.len())
            }
            IngestError::ExtractionFailed { reason } => reason.clone(),
            IngestError::Timeout { .. } => "Extraction timed out".to_string(),
            IngestError::ImageFetch(_) => "Dish photos are unavailable".to_string(),
            IngestError::InvalidInput(msg) => msg.clone(),
            IngestError::Cancelled => "Cancelled".to_string(),
        }
    }
}

fn format_indices(failures: &[UploadFailure]) -> String {
    failures
        .iter()
        .map(|f| f.index.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_upload_names_indices() {
        let err = IngestError::PartialUpload {
            failures: vec![
                UploadFailure { index: 0, reason: "403".into() },
                UploadFailure { index: 2, reason: "timeout".into() },
            ],
        };
        assert_eq!(err.to_string(), "2 of the uploads failed (indices 0, 2)");
        assert_eq!(err.kind(), ErrorKind::PartialUpload);
        assert_eq!(err.user_message(), "2 photos failed to upload");
    }

    #[test]
    fn only_image_fetch_is_non_terminal() {
        assert!(!IngestError::ImageFetch("boom".into()).is_terminal());
        assert!(IngestError::Timeout { attempts: 60 }.is_terminal());
        assert!(IngestError::request(Stage::Trigger, "502").is_terminal());
    }

    #[test]
    fn request_error_display_includes_stage() {
        let err = IngestError::request(Stage::Presign, "API error: 500");
        assert_eq!(err.to_string(), "presign request failed: API error: 500");
        assert_eq!(err.user_message(), "API error: 500");
    }
}
