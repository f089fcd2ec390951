use crate::{
    error::{Result, SyncError},
    types::{SearchItem, VideoRecord},
};

/// Records extracted from one page of search results.
#[derive(Debug, Default)]
pub struct Extracted {
    pub records: Vec<VideoRecord>,
    /// Channel and playlist results that were dropped.
    pub skipped: usize,
}

/// Keep the video results and map each to a [`VideoRecord`].
///
/// A video result without an id, snippet, publish time or `high` thumbnail fails the
/// whole page, so nothing is staged from a response we only half understand. Results
/// of any other kind, including ones with no kind at all, are skipped.
pub fn extract_records(items: &[SearchItem]) -> Result<Extracted> {
    let mut extracted = Extracted::default();

    for (index, item) in items.iter().enumerate() {
        if !item.id.is_video() {
            extracted.skipped += 1;
            continue;
        }
        extracted.records.push(to_record(index, item)?);
    }

    Ok(extracted)
}

fn to_record(index: usize, item: &SearchItem) -> Result<VideoRecord> {
    let malformed = |reason: &str| SyncError::MalformedItem {
        index,
        reason: reason.to_string(),
    };

    let video_id = item
        .id
        .video_id
        .as_ref()
        .ok_or_else(|| malformed("missing id.videoId"))?;
    let snippet = item.snippet.as_ref().ok_or_else(|| malformed("missing snippet"))?;
    let published_at = snippet
        .published_at
        .as_ref()
        .ok_or_else(|| malformed("missing snippet.publishedAt"))?;
    let thumbnail = snippet
        .thumbnails
        .high
        .as_ref()
        .ok_or_else(|| malformed("missing snippet.thumbnails.high"))?;

    Ok(VideoRecord {
        video_id: video_id.clone(),
        title: snippet.title.clone(),
        description: snippet.description.clone(),
        thumbnail_url: thumbnail.url.clone(),
        published_at: published_at.clone(),
    })
}
