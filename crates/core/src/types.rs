use serde::{Deserialize, Serialize};

/// `id.kind` of search results that are playable videos.
pub const VIDEO_KIND: &str = "youtube#video";

/// One video's public metadata as stored in the `videos` collection.
///
/// `title` and `description` are left out of the document when the API omits them, so
/// a merge keeps whatever was stored before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub video_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub thumbnail_url: String,
    pub published_at: String,
}

/// Body of a `youtube/v3/search` response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub items: Option<Vec<SearchItem>>,

    /// Everything else the API sent (kind, etag, pageInfo, error, ...), kept for diagnostics.
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: ResourceId,
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    /// Empty when the API left it out; such results are never videos.
    #[serde(default)]
    pub kind: String,
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
    pub playlist_id: Option<String>,
}

impl ResourceId {
    pub fn is_video(&self) -> bool {
        self.kind == VIDEO_KIND
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub published_at: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub standard: Option<Thumbnail>,
    pub maxres: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let record = VideoRecord {
            video_id: "abc123".into(),
            title: Some("T".into()),
            description: Some("D".into()),
            thumbnail_url: "http://x/hi.jpg".into(),
            published_at: "2024-01-01T00:00:00Z".into(),
        };

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "videoId": "abc123",
                "title": "T",
                "description": "D",
                "thumbnailUrl": "http://x/hi.jpg",
                "publishedAt": "2024-01-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn absent_title_and_description_are_not_serialized() {
        let record = VideoRecord {
            video_id: "abc123".into(),
            title: None,
            description: None,
            thumbnail_url: "http://x/hi.jpg".into(),
            published_at: "2024-01-01T00:00:00Z".into(),
        };

        let value = serde_json::to_value(&record).unwrap();

        assert!(value.get("title").is_none());
        assert!(value.get("description").is_none());
        assert_eq!(value["videoId"], "abc123");
    }

    #[test]
    fn result_without_kind_parses_as_non_video() {
        let item: SearchItem = serde_json::from_value(json!({
            "id": { "channelId": "UCx" }
        }))
        .unwrap();

        assert!(!item.id.is_video());
        assert!(item.id.kind.is_empty());
    }

    #[test]
    fn missing_items_deserializes_to_none_and_keeps_the_rest() {
        let response: SearchResponse = serde_json::from_value(json!({
            "kind": "youtube#searchListResponse",
            "pageInfo": { "totalResults": 0 }
        }))
        .unwrap();

        assert!(response.items.is_none());
        assert_eq!(response.rest["kind"], "youtube#searchListResponse");
    }

    #[test]
    fn null_items_deserializes_to_none() {
        let response: SearchResponse = serde_json::from_value(json!({ "items": null })).unwrap();
        assert!(response.items.is_none());
    }

    #[test]
    fn channel_results_parse_without_video_id() {
        let item: SearchItem = serde_json::from_value(json!({
            "id": { "kind": "youtube#channel", "channelId": "UC123" },
            "snippet": { "title": "Channel", "description": "" }
        }))
        .unwrap();

        assert!(!item.id.is_video());
        assert_eq!(item.id.channel_id.as_deref(), Some("UC123"));
        assert!(item.id.video_id.is_none());
    }
}
