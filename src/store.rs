//! Persisted feedback collection.
//!
//! The whole record sequence lives in one JSON blob under a storage key. The
//! blob is read and rewritten wholesale on every change; there is no locking
//! and the last writer wins.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::catalog;
use crate::error::StoreError;
use crate::models::{FeedbackRecord, Metadata, Sentiment};

pub const DEFAULT_STORAGE_KEY: &str = "pulseview-feedback";

/// Key/value backing for serialized blobs.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn write(&self, key: &str, blob: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: BlobStorage + ?Sized> BlobStorage for Box<T> {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        (**self).write(key, blob).await
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, blob: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        storage
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), blob.into());
        storage
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.raw(key))
    }

    async fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), blob.as_bytes().to_vec());
        Ok(())
    }
}

/// One `<key>.json` file per storage key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl BlobStorage for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let bytes = blob.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))??;
        Ok(())
    }
}

/// Writes `bytes` to a temp file beside `path`, then renames it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub struct FeedbackStore<S> {
    storage: S,
    key: String,
}

impl<S: BlobStorage> FeedbackStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns every stored record, seeding the store first when it is empty
    /// or unreadable. Bytes that are not UTF-8 JSON count as unreadable.
    pub async fn load(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        let blob = self.storage.read(&self.key).await?.unwrap_or_default();
        let records = if blob.iter().all(u8::is_ascii_whitespace) {
            Vec::new()
        } else {
            match serde_json::from_slice::<Vec<FeedbackRecord>>(&blob) {
                Ok(records) => records,
                Err(err) => {
                    warn!(key = %self.key, error = %err, "stored feedback is corrupt, reseeding");
                    Vec::new()
                }
            }
        };

        if !records.is_empty() {
            debug!(key = %self.key, count = records.len(), "loaded feedback");
            return Ok(records);
        }

        let seed = seed_records(Utc::now());
        self.save(&seed).await?;
        debug!(key = %self.key, count = seed.len(), "seeded empty feedback store");
        Ok(seed)
    }

    pub async fn append(&self, record: FeedbackRecord) -> Result<(), StoreError> {
        let mut records = self.load().await?;
        records.push(record);
        self.save(&records).await
    }

    async fn save(&self, records: &[FeedbackRecord]) -> Result<(), StoreError> {
        let blob = serde_json::to_string(records)?;
        self.storage.write(&self.key, &blob).await?;
        debug!(key = %self.key, count = records.len(), "saved feedback");
        Ok(())
    }
}

/// Example records written into an empty store, dated 1, 2 and 3 days
/// before `now`.
pub fn seed_records(now: DateTime<Utc>) -> Vec<FeedbackRecord> {
    let seeds = [
        (
            "1",
            "Housing costs are making it impossible for young professionals to live independently",
            Sentiment::Negative,
            "Professional",
        ),
        (
            "2",
            "AI tools should be allowed but with proper guidelines and transparency",
            Sentiment::Positive,
            "Student",
        ),
        (
            "3",
            "Better drainage systems and awareness campaigns are needed urgently",
            Sentiment::Neutral,
            "Health Worker",
        ),
    ];

    seeds
        .into_iter()
        .zip(1..)
        .map(|((id, text, sentiment, role), days_ago)| FeedbackRecord {
            id: id.to_string(),
            issue_id: id.to_string(),
            issue_title: catalog::find(id)
                .map(|issue| issue.title.to_string())
                .unwrap_or_default(),
            text: text.to_string(),
            sentiment,
            submitted_at: now - Duration::days(days_ago),
            metadata: Metadata {
                role: Some(role.to_string()),
                ..Metadata::default()
            },
        })
        .collect()
}
