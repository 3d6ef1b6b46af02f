use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::domain::{ports::CorpusSource, Document, DocumentCorpus, DomainError};

#[derive(Debug, Deserialize)]
struct CorpusRow {
    #[serde(default)]
    id: Option<String>,
    text: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// Reads a JSON array of `{ "id"?, "text", "metadata"? }` rows.
///
/// Rows without an id are numbered `row-<n>` by position; rows with blank text
/// are skipped.
pub struct JsonCorpusSource {
    path: PathBuf,
}

impl JsonCorpusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse(raw: &str) -> Result<DocumentCorpus, DomainError> {
        let rows: Vec<CorpusRow> = serde_json::from_str(raw)?;
        let total = rows.len();

        let documents: Vec<Document> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let id = row
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| format!("row-{}", i + 1));
                match Document::new(id, row.text) {
                    Ok(doc) => Some(doc.with_metadata(row.metadata)),
                    Err(e) => {
                        warn!(row = i + 1, error = %e, "skipping corpus row");
                        None
                    }
                }
            })
            .collect();

        if documents.len() < total {
            info!(kept = documents.len(), skipped = total - documents.len(), "corpus rows skipped");
        }
        Ok(DocumentCorpus::new(documents))
    }
}

#[async_trait]
impl CorpusSource for JsonCorpusSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<DocumentCorpus, DomainError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let corpus = Self::parse(&raw)?;
        info!(documents = corpus.len(), "corpus loaded");
        Ok(corpus)
    }
}
