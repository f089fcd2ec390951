use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    error::Result,
    store::{DocumentStore, WriteBatch},
    transform::extract_records,
    youtube::YouTubeClient,
};

/// Collection the records land in.
pub const VIDEOS_COLLECTION: &str = "videos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The response carried no `items` field; nothing was written.
    NoItems,
    /// `written` records were committed in one batch, `skipped` non-video results dropped.
    Committed { written: usize, skipped: usize },
}

/// Polls one channel and upserts its latest videos.
///
/// The HTTP client and the store are owned by whoever bootstraps the process.
pub struct VideoSyncJob {
    client: YouTubeClient,
    store: Arc<dyn DocumentStore>,
    channel_id: String,
    collection: String,
}

impl VideoSyncJob {
    pub fn new(
        client: YouTubeClient,
        store: Arc<dyn DocumentStore>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            channel_id: channel_id.into(),
            collection: VIDEOS_COLLECTION.to_string(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Fetch, map and commit. Errors are returned to the caller.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let response = self.client.search_latest(&self.channel_id).await?;

        let Some(items) = response.items.as_deref() else {
            warn!(?response, "search response has no items, nothing to write");
            return Ok(SyncOutcome::NoItems);
        };

        let extracted = extract_records(items)?;

        let mut batch = WriteBatch::new();
        for record in &extracted.records {
            batch.set_merge(&self.collection, &record.video_id, record)?;
        }

        let written = batch.len();
        if batch.is_empty() {
            debug!(skipped = extracted.skipped, "no videos in response");
        } else {
            self.store.commit(batch).await?;
        }

        Ok(SyncOutcome::Committed {
            written,
            skipped: extracted.skipped,
        })
    }

    /// Scheduler entry point. Never fails: errors are logged and `None` is returned.
    pub async fn run(&self) -> Option<SyncOutcome> {
        let span = info_span!(
            "video_sync",
            run_id = %Uuid::new_v4(),
            channel_id = %self.channel_id,
            store = self.store.name(),
        );

        async {
            match self.sync().await {
                Ok(outcome) => {
                    if let SyncOutcome::Committed { written, skipped } = outcome {
                        info!(written, skipped, collection = %self.collection, "videos updated");
                    }
                    Some(outcome)
                }
                Err(e) => {
                    error!(error = %e, "video sync failed");
                    None
                }
            }
        }
        .instrument(span)
        .await
    }
}
