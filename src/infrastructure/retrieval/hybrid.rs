use crate::domain::{
    ports::Retriever, DocumentCorpus, DomainError, EmbeddingRecord, RetrievalQuery,
    RetrievalResult,
};
use crate::infrastructure::retrieval::{lexical::LexicalIndex, rank};

/// Blend of semantic and lexical scores. The two weights sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    semantic: f64,
    lexical: f64,
}

impl HybridWeights {
    pub fn new(semantic: f64, lexical: f64) -> Result<Self, DomainError> {
        if semantic < 0.0 || lexical < 0.0 {
            return Err(DomainError::validation("negative hybrid weight"));
        }
        if (semantic + lexical - 1.0).abs() > 1e-3 {
            return Err(DomainError::validation(format!(
                "hybrid weights must sum to 1.0, got {semantic} + {lexical}"
            )));
        }
        Ok(Self { semantic, lexical })
    }

    pub fn semantic(&self) -> f64 {
        self.semantic
    }

    pub fn lexical(&self) -> f64 {
        self.lexical
    }

    fn combine(&self, semantic: f64, lexical: f64) -> f64 {
        self.semantic * semantic + self.lexical * lexical
    }
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            semantic: 0.7,
            lexical: 0.3,
        }
    }
}

/// Scores every cached record by a weighted sum of embedding cosine
/// similarity and TF-IDF keyword similarity against the corpus text.
///
/// `min_similarity` and the reported `similarity` both refer to the combined
/// score. Records whose document is not in the indexed corpus get a lexical
/// score of zero.
#[derive(Debug, Clone)]
pub struct HybridRetriever {
    index: LexicalIndex,
    weights: HybridWeights,
}

impl HybridRetriever {
    pub fn new(corpus: &DocumentCorpus, weights: HybridWeights) -> Self {
        let index = LexicalIndex::build(corpus);
        tracing::debug!(
            documents = index.len(),
            semantic = weights.semantic,
            lexical = weights.lexical,
            "lexical index built"
        );
        Self { index, weights }
    }
}

impl Retriever for HybridRetriever {
    fn retrieve(
        &self,
        query: &RetrievalQuery<'_>,
        records: &[EmbeddingRecord],
        max_results: usize,
        min_similarity: f64,
    ) -> Vec<RetrievalResult> {
        let terms = self.index.vectorize(query.text);

        let scored = records.iter().enumerate().map(|(i, record)| {
            let semantic = query.embedding.cosine_similarity(&record.vector);
            let lexical = if terms.is_empty() {
                0.0
            } else {
                self.index.similarity(&terms, &record.document_id)
            };
            (i, self.weights.combine(semantic, lexical))
        });
        rank(scored, records, max_results, min_similarity)
    }
}
