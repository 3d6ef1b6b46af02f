use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(pub Vec<f64>);

impl Embedding {
    pub fn new(vec: Vec<f64>) -> Self {
        Self(vec)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn norm(&self) -> f64 {
        self.0.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Cosine similarity in [-1, 1]. Zero when either vector has zero norm or
    /// the dimensions disagree.
    pub fn cosine_similarity(&self, other: &Embedding) -> f64 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }

        let dot_product: f64 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

impl From<Vec<f64>> for Embedding {
    fn from(vec: Vec<f64>) -> Self {
        Self(vec)
    }
}

impl AsRef<[f64]> for Embedding {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Cached vector for one document, with the provenance needed to decide
/// whether it is still valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub document_id: String,
    pub vector: Embedding,
    pub model_name: String,
    pub content_fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    pub fn new(document: &Document, vector: Embedding, model_name: impl Into<String>) -> Self {
        Self {
            document_id: document.id.clone(),
            vector,
            model_name: model_name.into(),
            content_fingerprint: document.content_fingerprint.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn is_fresh_for(&self, document: &Document, current_model: &str) -> bool {
        self.document_id == document.id
            && self.content_fingerprint == document.content_fingerprint
            && self.model_name == current_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = Embedding::new(vec![0.3, -1.2, 4.0]);
        assert!((a.cosine_similarity(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_and_opposite() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 2.0]);
        let c = Embedding::new(vec![-3.0, 0.0]);

        assert!(a.cosine_similarity(&b).abs() < 1e-12);
        assert!((a.cosine_similarity(&c) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_zero_norm_is_zero() {
        let zero = Embedding::new(vec![0.0, 0.0, 0.0]);
        let a = Embedding::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(zero.cosine_similarity(&a), 0.0);
        assert_eq!(a.cosine_similarity(&zero), 0.0);
    }

    #[test]
    fn test_record_freshness() {
        let doc = Document::new("7", "row seven").unwrap();
        let record = EmbeddingRecord::new(&doc, Embedding::new(vec![1.0]), "model-a");

        assert!(record.is_fresh_for(&doc, "model-a"));
        assert!(!record.is_fresh_for(&doc, "model-b"));

        let edited = Document::new("7", "row seven, edited").unwrap();
        assert!(!record.is_fresh_for(&edited, "model-a"));
    }
}
