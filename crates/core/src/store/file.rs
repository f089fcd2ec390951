use std::{
    collections::BTreeMap,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::{fs, sync::Mutex};

use crate::{
    error::{Result, SyncError},
    store::{DocumentStore, Fields, WriteBatch, merge_fields},
};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

/// Get the default location of the local store file
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("tubesync")
        .join("store.json")
}

/// JSON file on disk. Each commit rewrites the file through a rename, so a reader
/// never observes a half-applied batch.
///
/// Commits are serialized within one process only. Two processes committing to the
/// same file race on load-merge-save and the later one can drop the other's documents;
/// point concurrent writers at Firestore instead.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, collection: &str, document_id: &str) -> Result<Option<Fields>> {
        let mut collections = load(&self.path).await?;
        Ok(collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(document_id)))
    }

    /// All documents of a collection, ordered by id.
    pub async fn list(&self, collection: &str) -> Result<Vec<(String, Fields)>> {
        let mut collections = load(&self.path).await?;
        Ok(collections
            .remove(collection)
            .map(|docs| docs.into_iter().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut collections = load(&self.path).await?;
        for write in batch.into_writes() {
            let document = collections
                .entry(write.collection)
                .or_default()
                .entry(write.document_id)
                .or_default();
            merge_fields(document, write.fields);
        }

        save(&self.path, &collections).await
    }
}

async fn load(path: &Path) -> Result<Collections> {
    match fs::read_to_string(path).await {
        Ok(json_content) => Ok(serde_json::from_str(&json_content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Collections::new()),
        Err(e) => Err(e.into()),
    }
}

async fn save(path: &Path, collections: &Collections) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(collections)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || replace_file(&path, pretty_json.as_bytes()))
        .await
        .map_err(|e| SyncError::Io(std::io::Error::other(e)))?
}

/// Write to a uniquely named sibling temp file, then rename it over `path`.
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
