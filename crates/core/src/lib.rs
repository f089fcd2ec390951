//! tubesync core library
//!
//! Polls a YouTube channel's newest uploads and upserts them into a keyed document
//! store, merging into existing documents rather than replacing them.

pub mod config;
pub mod error;
pub mod format;
pub mod job;
pub mod schedule;
pub mod store;
pub mod transform;
pub mod types;
pub mod youtube;

// Re-export commonly used items at crate root
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use format::{format_outcome, format_videos_readable};
pub use job::{SyncOutcome, VIDEOS_COLLECTION, VideoSyncJob};
pub use schedule::{DEFAULT_INTERVAL, run_every};
pub use store::{
    DocumentStore, FileStore, FirestoreConfig, FirestoreStore, MemoryStore, WriteBatch,
};
pub use transform::{Extracted, extract_records};
pub use types::{SearchItem, SearchResponse, VideoRecord};
pub use youtube::{PAGE_SIZE, YouTubeClient};
