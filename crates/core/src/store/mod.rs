//! Keyed document stores with atomic, merge-on-write batches.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};

pub mod file;
pub mod firestore;
pub mod memory;

pub use file::FileStore;
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;

pub type Fields = Map<String, Value>;

/// A store that applies a [`WriteBatch`] all-or-nothing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// Create the document if absent, otherwise overwrite only the fields given.
#[derive(Debug, Clone, PartialEq)]
pub struct SetMerge {
    pub collection: String,
    pub document_id: String,
    pub fields: Fields,
}

#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<SetMerge>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an upsert-with-merge of `data` at `collection/document_id`.
    pub fn set_merge<T: Serialize>(
        &mut self,
        collection: &str,
        document_id: &str,
        data: &T,
    ) -> Result<()> {
        let Value::Object(fields) = serde_json::to_value(data)? else {
            return Err(SyncError::NotAnObject {
                document_id: document_id.to_string(),
            });
        };

        self.writes.push(SetMerge {
            collection: collection.to_string(),
            document_id: document_id.to_string(),
            fields,
        });
        Ok(())
    }

    pub fn writes(&self) -> &[SetMerge] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<SetMerge> {
        self.writes
    }
}

/// Merge `incoming` into `existing`. Nested objects merge recursively, everything else
/// is replaced. Fields missing from `incoming` are left alone.
pub fn merge_fields(existing: &mut Fields, incoming: Fields) {
    for (key, value) in incoming {
        match value {
            Value::Object(next) => match existing.get_mut(&key) {
                Some(Value::Object(current)) => merge_fields(current, next),
                _ => {
                    existing.insert(key, Value::Object(next));
                }
            },
            value => {
                existing.insert(key, value);
            }
        }
    }
}

/// Dotted paths of every leaf written by `fields`; this is the mask a merge touches.
pub fn leaf_paths(fields: &Fields) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    collect_leaf_paths(fields, &mut Vec::new(), &mut paths);
    paths
}

fn collect_leaf_paths(fields: &Fields, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    for (key, value) in fields {
        prefix.push(key.clone());
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_leaf_paths(nested, prefix, out),
            _ => out.push(prefix.clone()),
        }
        prefix.pop();
    }
}
