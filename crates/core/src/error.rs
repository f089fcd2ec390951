use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Missing configuration: {env_var} environment variable is not set")]
    MissingConfig { env_var: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YouTube API quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("YouTube API returned {status}: {message}")]
    ApiStatus { status: StatusCode, message: String },

    #[error("Malformed search item {index}: {reason}")]
    MalformedItem { index: usize, reason: String },

    #[error("Document {document_id} does not serialize to a JSON object")]
    NotAnObject { document_id: String },

    #[error("Store {store} rejected the batch ({status}): {message}")]
    StoreRejected {
        store: &'static str,
        status: StatusCode,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
