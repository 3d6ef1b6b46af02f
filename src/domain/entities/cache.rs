use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of one reconciliation pass over the corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub embedded_count: usize,
    pub reused_count: usize,
    pub failed_ids: Vec<String>,
    /// Entries dropped because their document left the corpus.
    pub removed_count: usize,
    pub duration_ms: u64,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.failed_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub exists: bool,
    pub entry_count: usize,
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub path: PathBuf,
    pub model_name: String,
    pub dimension: usize,
}
