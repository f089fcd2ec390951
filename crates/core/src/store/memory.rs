use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::Result,
    store::{DocumentStore, Fields, WriteBatch, merge_fields},
};

type Collections = HashMap<String, HashMap<String, Fields>>;

/// Process-local store. A batch is applied under a single write lock, so readers see
/// either none or all of it.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document as-is, bypassing merge.
    pub async fn seed(&self, collection: &str, document_id: &str, fields: Fields) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(document_id.to_string(), fields);
    }

    pub async fn get(&self, collection: &str, document_id: &str) -> Option<Fields> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(document_id))
            .cloned()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |docs| docs.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.collections.read().await.values().all(|docs| docs.is_empty())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut collections = self.collections.write().await;
        for write in batch.into_writes() {
            let document = collections
                .entry(write.collection)
                .or_default()
                .entry(write.document_id)
                .or_default();
            merge_fields(document, write.fields);
        }
        Ok(())
    }
}
