//! Clients for the services the ingestion pipeline talks to.
//!
//! - [`HttpBackend`]: the menu API over JSON/HTTP
//! - [`HttpObjectStore`]: raw `PUT`s to presigned storage URLs
//! - [`mock`]: scripted in-memory doubles of both

pub mod http;
pub mod mock;
pub mod storage;

pub use http::HttpBackend;
pub use mock::{MemoryStore, ScriptedBackend};
pub use storage::HttpObjectStore;
