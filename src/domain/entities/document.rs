use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

use crate::domain::errors::DomainError;

/// A single corpus row. Identity is `id`; the fingerprint is derived from `text`
/// so a changed row invalidates its cached embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    pub content_fingerprint: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let text = text.into();

        if id.trim().is_empty() {
            return Err(DomainError::validation("document id must not be empty"));
        }
        if text.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "document {id} has empty text"
            )));
        }

        let content_fingerprint = fingerprint(&text);
        Ok(Self {
            id,
            text,
            metadata: BTreeMap::new(),
            content_fingerprint,
        })
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

}

/// Hex-encoded SHA-256 of the document text.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Ordered, immutable collection of documents handed over by ingestion.
///
/// Duplicate ids are kept in `documents()` (reconciliation resolves them, last
/// one wins); lookups by id always return the last occurrence.
#[derive(Debug, Clone, Default)]
pub struct DocumentCorpus {
    documents: Vec<Document>,
    index: HashMap<String, usize>,
}

impl DocumentCorpus {
    pub fn new(documents: Vec<Document>) -> Self {
        let index = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| (doc.id.clone(), i))
            .collect();
        Self { documents, index }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.index.get(id).map(|&i| &self.documents[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents with duplicate ids collapsed to their last occurrence,
    /// keeping the corpus position of each surviving row.
    pub fn unique_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .enumerate()
            .filter(|(i, doc)| self.index.get(&doc.id) == Some(i))
            .map(|(_, doc)| doc)
    }
}

impl FromIterator<Document> for DocumentCorpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
