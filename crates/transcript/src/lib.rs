//! Transcript ingestion and the immutable message store.
//!
//! The transcript is loaded exactly once at startup through a
//! `TranscriptLoader` and then held read-only for the lifetime of the
//! process. Replacing it means reloading and swapping the whole store,
//! never editing in place — concurrent readers stay safe without locks.

pub mod loader;
pub mod store;

pub use loader::{HttpLoader, JsonFileLoader, TranscriptLoader, TranscriptRecord};
pub use store::TranscriptStore;
