use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::{CacheStatus, Document, DomainError, EmbeddingRecord};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CacheFileRef<'a> {
    format_version: u32,
    model_name: &'a str,
    dimension: usize,
    updated_at: DateTime<Utc>,
    entries: &'a [EmbeddingRecord],
}

#[derive(Deserialize)]
struct CacheFile {
    format_version: u32,
    model_name: String,
    dimension: usize,
    entries: Vec<EmbeddingRecord>,
}

#[derive(Debug, Default)]
struct Entries {
    records: Vec<EmbeddingRecord>,
    index: HashMap<String, usize>,
}

impl Entries {
    fn from_records(records: Vec<EmbeddingRecord>) -> Self {
        let mut entries = Self::default();
        for record in records {
            entries.upsert(record);
        }
        entries
    }

    /// Replaces in place so a document keeps its original insertion position.
    fn upsert(&mut self, record: EmbeddingRecord) {
        match self.index.get(&record.document_id) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.document_id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Keeps records matching `keep` in their current order and rebuilds the
    /// index. Returns how many were dropped.
    fn retain(&mut self, mut keep: impl FnMut(&EmbeddingRecord) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|record| keep(record));
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.document_id.clone(), i))
            .collect();
        before - self.records.len()
    }
}

/// Persisted `document_id -> EmbeddingRecord` map for a single embedding model.
///
/// Reads take a shared lock and never observe a partially written record;
/// writers are expected to be serialised by the caller (see `EmbeddingManager`).
/// `persist` replaces the file atomically via a temp file and rename.
#[derive(Debug)]
pub struct VectorCache {
    path: PathBuf,
    model_name: String,
    dimension: usize,
    entries: RwLock<Entries>,
    persist_lock: Mutex<()>,
}

impl VectorCache {
    pub fn empty(
        path: impl Into<PathBuf>,
        model_name: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            path: path.into(),
            model_name: model_name.into(),
            dimension,
            entries: RwLock::new(Entries::default()),
            persist_lock: Mutex::new(()),
        }
    }

    /// One cache file per model, e.g. `embeddings-text-embedding-3-small.json`.
    pub fn path_for(dir: impl AsRef<Path>, model_name: &str) -> PathBuf {
        let sanitized: String = model_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        dir.as_ref().join(format!("embeddings-{sanitized}.json"))
    }

    /// Loads the cache, treating a missing file or a file written for another
    /// model as empty. Fails with `CacheCorrupt` when the file cannot be decoded.
    pub async fn try_load(
        path: impl Into<PathBuf>,
        model_name: impl Into<String>,
        dimension: usize,
    ) -> Result<Self, DomainError> {
        let cache = Self::empty(path, model_name, dimension);

        let bytes = match tokio::fs::read(&cache.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %cache.path.display(), "no cache file, starting empty");
                return Ok(cache);
            }
            Err(e) => return Err(e.into()),
        };

        let file: CacheFile = serde_json::from_slice(&bytes)
            .map_err(|e| DomainError::cache_corrupt(format!("{}: {e}", cache.path.display())))?;

        if file.format_version != FORMAT_VERSION {
            return Err(DomainError::cache_corrupt(format!(
                "unsupported format version {}",
                file.format_version
            )));
        }

        if file.model_name != cache.model_name || file.dimension != cache.dimension {
            info!(
                cached_model = %file.model_name,
                cached_dimension = file.dimension,
                model = %cache.model_name,
                dimension = cache.dimension,
                "cache written for a different model, starting empty"
            );
            return Ok(cache);
        }

        if let Some(bad) = file
            .entries
            .iter()
            .find(|r| r.vector.dimension() != cache.dimension || r.model_name != cache.model_name)
        {
            return Err(DomainError::cache_corrupt(format!(
                "record {} does not match cache model/dimension",
                bad.document_id
            )));
        }

        *cache.write_entries() = Entries::from_records(file.entries);
        info!(path = %cache.path.display(), entries = cache.len(), "cache loaded");
        Ok(cache)
    }

    /// Like `try_load`, but a corrupt or unreadable cache is logged and replaced
    /// by an empty one. The cache is derived data and can always be rebuilt.
    pub async fn load(
        path: impl Into<PathBuf>,
        model_name: impl Into<String>,
        dimension: usize,
    ) -> Self {
        let path = path.into();
        let model_name = model_name.into();

        match Self::try_load(path.clone(), model_name.clone(), dimension).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache");
                Self::empty(path, model_name, dimension)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.read_entries().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, document_id: &str) -> Option<EmbeddingRecord> {
        let entries = self.read_entries();
        entries
            .index
            .get(document_id)
            .map(|&i| entries.records[i].clone())
    }

    pub fn put(&self, record: EmbeddingRecord) -> Result<(), DomainError> {
        self.put_all(vec![record])
    }

    /// Inserts a batch under one write lock; either every record is accepted
    /// or none is.
    pub fn put_all(&self, records: Vec<EmbeddingRecord>) -> Result<(), DomainError> {
        for record in &records {
            self.check_record(record)?;
        }

        let mut entries = self.write_entries();
        for record in records {
            entries.upsert(record);
        }
        Ok(())
    }

    /// Drops the entries for `document_ids`. Returns how many existed.
    pub fn remove(&self, document_ids: &[&str]) -> usize {
        self.write_entries()
            .retain(|record| !document_ids.contains(&record.document_id.as_str()))
    }

    /// Keeps only entries whose document id satisfies `keep`.
    pub fn retain_ids(&self, keep: impl Fn(&str) -> bool) -> usize {
        self.write_entries()
            .retain(|record| keep(&record.document_id))
    }

    pub fn is_fresh(&self, document: &Document) -> bool {
        let entries = self.read_entries();
        entries
            .index
            .get(&document.id)
            .is_some_and(|&i| entries.records[i].is_fresh_for(document, &self.model_name))
    }

    /// Runs `f` over all records in insertion order while holding the read lock.
    pub fn with_records<R>(&self, f: impl FnOnce(&[EmbeddingRecord]) -> R) -> R {
        f(&self.read_entries().records)
    }

    pub fn records(&self) -> Vec<EmbeddingRecord> {
        self.read_entries().records.clone()
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn persist(&self) -> Result<(), DomainError> {
        let _guard = self.persist_lock.lock().await;

        let bytes = {
            let entries = self.read_entries();
            serde_json::to_vec(&CacheFileRef {
                format_version: FORMAT_VERSION,
                model_name: &self.model_name,
                dimension: self.dimension,
                updated_at: Utc::now(),
                entries: &entries.records,
            })?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path).await?;
        debug!(bytes = bytes.len(), "cache persisted");
        Ok(())
    }

    /// Drops every entry and removes the cache file.
    pub async fn clear(&self) -> Result<(), DomainError> {
        let _guard = self.persist_lock.lock().await;
        *self.write_entries() = Entries::default();

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!(path = %self.path.display(), "cache cleared");
        Ok(())
    }

    pub async fn status(&self) -> CacheStatus {
        let metadata = tokio::fs::metadata(&self.path).await.ok();
        CacheStatus {
            exists: metadata.is_some(),
            entry_count: self.len(),
            size_bytes: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
            last_modified: metadata
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
            path: self.path.clone(),
            model_name: self.model_name.clone(),
            dimension: self.dimension,
        }
    }

    fn check_record(&self, record: &EmbeddingRecord) -> Result<(), DomainError> {
        if record.model_name != self.model_name {
            return Err(DomainError::internal(format!(
                "record {} was embedded with {}, cache holds {}",
                record.document_id, record.model_name, self.model_name
            )));
        }
        if record.vector.dimension() != self.dimension {
            return Err(DomainError::internal(format!(
                "record {} has dimension {}, cache expects {}",
                record.document_id,
                record.vector.dimension(),
                self.dimension
            )));
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
