//! Cloud Firestore over its REST API.
//!
//! A batch maps to one `documents:commit` call. Each write is an `update` with an
//! `updateMask` listing exactly the fields written, which is how Firestore spells
//! "set with merge".

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
    config::{optional_env, required_env},
    error::{Result, SyncError},
    store::{DocumentStore, Fields, SetMerge, WriteBatch, leaf_paths},
};

pub const PROJECT_ID_ENV: &str = "FIRESTORE_PROJECT_ID";
pub const ACCESS_TOKEN_ENV: &str = "FIRESTORE_ACCESS_TOKEN";
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";

#[derive(Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub base_url: String,
    /// OAuth bearer token. Obtaining it is left to the caller.
    pub access_token: Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
        }
    }

    /// `FIRESTORE_EMULATOR_HOST` wins over the production endpoint, the same way the
    /// Firebase SDKs behave.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(required_env(PROJECT_ID_ENV)?);

        if let Some(host) = optional_env(EMULATOR_HOST_ENV) {
            config.base_url = format!("http://{host}");
            config.access_token = Some("owner".to_string());
        } else {
            config.access_token = optional_env(ACCESS_TOKEN_ENV);
        }

        Ok(config)
    }

    fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.project_id, self.database
        )
    }
}

impl std::fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub struct FirestoreStore {
    http: reqwest::Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    pub fn new(http: reqwest::Client, config: FirestoreConfig) -> Self {
        Self { http, config }
    }

    pub fn commit_url(&self) -> String {
        format!(
            "{}/v1/{}/documents:commit",
            self.config.base_url.trim_end_matches('/'),
            self.config.database_path()
        )
    }

    /// Request body for `documents:commit`.
    pub fn commit_body(&self, batch: &WriteBatch) -> Value {
        let writes: Vec<Value> = batch
            .writes()
            .iter()
            .map(|write| self.update_write(write))
            .collect();
        json!({ "writes": writes })
    }

    fn update_write(&self, write: &SetMerge) -> Value {
        let name = format!(
            "{}/documents/{}/{}",
            self.config.database_path(),
            write.collection,
            write.document_id
        );
        let field_paths: Vec<String> = leaf_paths(&write.fields)
            .iter()
            .map(|segments| field_path(segments))
            .collect();

        json!({
            "update": {
                "name": name,
                "fields": encode_fields(&write.fields),
            },
            "updateMask": { "fieldPaths": field_paths },
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &'static str {
        "firestore"
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let url = self.commit_url();
        debug!(%url, writes = batch.len(), "committing batch");

        let mut request = self.http.post(&url).json(&self.commit_body(&batch));
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(body);

        Err(SyncError::StoreRejected {
            store: self.name(),
            status,
            message,
        })
    }
}

/// Encode a JSON value as a Firestore `Value`.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // int64 travels as a string in the REST encoding
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    Value::Object(encoded)
}

/// Join segments into a field path, backtick-quoting any that are not plain identifiers.
pub fn field_path(segments: &[String]) -> String {
    segments
        .iter()
        .map(|segment| {
            let mut chars = segment.chars();
            let simple = chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
            if simple {
                segment.clone()
            } else {
                format!("`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode as AxumStatus, Uri},
    };

    use super::*;

    #[derive(Clone, Default)]
    struct Captured {
        calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn fake_firestore(status: AxumStatus, reply: Value) -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .fallback(
                move |State(captured): State<Captured>,
                      uri: Uri,
                      headers: HeaderMap,
                      Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        captured
                            .calls
                            .lock()
                            .unwrap()
                            .push((uri.path().to_string(), auth, body));
                        (status, Json(reply))
                    }
                },
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), captured)
    }

    fn store_at(base_url: &str, token: Option<&str>) -> FirestoreStore {
        let mut config = FirestoreConfig::new("demo-project");
        config.base_url = base_url.to_string();
        config.access_token = token.map(str::to_string);
        FirestoreStore::new(reqwest::Client::new(), config)
    }

    #[test]
    fn encodes_scalars_and_containers() {
        assert_eq!(encode_value(&json!("x")), json!({ "stringValue": "x" }));
        assert_eq!(encode_value(&json!(7)), json!({ "integerValue": "7" }));
        assert_eq!(encode_value(&json!(1.5)), json!({ "doubleValue": 1.5 }));
        assert_eq!(encode_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(&Value::Null), json!({ "nullValue": null }));
        assert_eq!(
            encode_value(&json!({ "tags": ["a"] })),
            json!({ "mapValue": { "fields": {
                "tags": { "arrayValue": { "values": [{ "stringValue": "a" }] } }
            } } })
        );
    }

    #[test]
    fn quotes_non_identifier_segments() {
        let path = field_path(&["meta".to_string(), "first-seen".to_string()]);
        assert_eq!(path, "meta.`first-seen`");

        assert_eq!(field_path(&["videoId".to_string()]), "videoId");
        assert_eq!(field_path(&["1st".to_string()]), "`1st`");
    }

    #[test]
    fn commit_body_masks_exactly_the_written_fields() {
        let store = store_at(DEFAULT_BASE_URL, None);
        let mut batch = WriteBatch::new();
        batch
            .set_merge("videos", "abc123", &json!({ "videoId": "abc123", "title": "T" }))
            .unwrap();

        let body = store.commit_body(&batch);

        assert_eq!(
            body,
            json!({ "writes": [{
                "update": {
                    "name": "projects/demo-project/databases/(default)/documents/videos/abc123",
                    "fields": {
                        "title": { "stringValue": "T" },
                        "videoId": { "stringValue": "abc123" }
                    }
                },
                "updateMask": { "fieldPaths": ["title", "videoId"] }
            }] })
        );
    }

    #[tokio::test]
    async fn commit_posts_one_request_with_bearer_token() {
        let (base_url, captured) = fake_firestore(AxumStatus::OK, json!({ "writeResults": [] })).await;
        let store = store_at(&base_url, Some("token-1"));

        let mut batch = WriteBatch::new();
        batch.set_merge("videos", "a", &json!({ "title": "A" })).unwrap();
        batch.set_merge("videos", "b", &json!({ "title": "B" })).unwrap();
        store.commit(batch).await.unwrap();

        let calls = captured.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        let (path, auth, body) = &calls[0];
        assert_eq!(
            path,
            "/v1/projects/demo-project/databases/(default)/documents:commit"
        );
        assert_eq!(auth.as_deref(), Some("Bearer token-1"));
        assert_eq!(body["writes"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejection_surfaces_the_error_message() {
        let (base_url, _) = fake_firestore(
            AxumStatus::FORBIDDEN,
            json!({ "error": { "code": 403, "message": "Missing or insufficient permissions." } }),
        )
        .await;
        let store = store_at(&base_url, None);

        let mut batch = WriteBatch::new();
        batch.set_merge("videos", "a", &json!({ "title": "A" })).unwrap();
        let err = store.commit(batch).await.unwrap_err();

        match err {
            SyncError::StoreRejected {
                store,
                status,
                message,
            } => {
                assert_eq!(store, "firestore");
                assert_eq!(status.as_u16(), 403);
                assert_eq!(message, "Missing or insufficient permissions.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
