use std::fmt;

use menusnap_core::{DishImageSet, ErrorKind, IngestError, Menu, RunId};

/// Observable state of the ingestion pipeline.
///
/// Exactly one state holds at a time. `Complete` and `Error` stay put until
/// the next run, retry or cancel.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    /// Covers presign and the upload fan-out.
    Uploading { asset_count: usize },
    /// Covers the trigger and every status poll.
    Extracting {
        run_id: RunId,
        attempt: u32,
        max_attempts: u32,
    },
    AwaitingImages { run_id: RunId },
    Complete {
        run_id: RunId,
        menu: Menu,
        images: DishImageSet,
    },
    Error {
        /// Unset when the run failed before presign issued an id.
        run_id: Option<RunId>,
        kind: ErrorKind,
        message: String,
    },
}

impl PipelineState {
    pub fn error(run_id: Option<RunId>, err: &IngestError) -> Self {
        PipelineState::Error {
            run_id,
            kind: err.kind(),
            message: err.user_message(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "IDLE",
            PipelineState::Uploading { .. } => "UPLOADING",
            PipelineState::Extracting { .. } => "EXTRACTING",
            PipelineState::AwaitingImages { .. } => "AWAITING_IMAGES",
            PipelineState::Complete { .. } => "COMPLETE",
            PipelineState::Error { .. } => "ERROR",
        }
    }

    /// A session is driving the pipeline.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PipelineState::Uploading { .. }
                | PipelineState::Extracting { .. }
                | PipelineState::AwaitingImages { .. }
        )
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, PipelineState::Complete { .. } | PipelineState::Error { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            PipelineState::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn run_id(&self) -> Option<&RunId> {
        match self {
            PipelineState::Idle | PipelineState::Uploading { .. } => None,
            PipelineState::Extracting { run_id, .. }
            | PipelineState::AwaitingImages { run_id }
            | PipelineState::Complete { run_id, .. } => Some(run_id),
            PipelineState::Error { run_id, .. } => run_id.as_ref(),
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Uploading { asset_count } => {
                write!(f, "UPLOADING ({asset_count} photos)")
            }
            PipelineState::Extracting { attempt, max_attempts, .. } => {
                write!(f, "EXTRACTING (poll {attempt}/{max_attempts})")
            }
            PipelineState::Error { message, .. } => write!(f, "ERROR: {message}"),
            other => f.write_str(other.label()),
        }
    }
}

/// State tagged with the session that produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub session: u64,
    pub state: PipelineState,
}
