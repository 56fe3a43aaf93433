//! Structured logging for menusnap.
//!
//! Console + rolling NDJSON file output, redaction of presigned URLs and
//! bearer tokens, and the pipeline event logger.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
