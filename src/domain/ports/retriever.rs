use crate::domain::{EmbeddingRecord, RetrievalQuery, RetrievalResult};

/// Ranks cached vectors against a query.
///
/// Implementations never fail: an empty result means nothing cleared
/// `min_similarity`. `records` is in cache insertion order, which is the
/// tie-break order for equal similarities.
pub trait Retriever: Send + Sync {
    fn retrieve(
        &self,
        query: &RetrievalQuery<'_>,
        records: &[EmbeddingRecord],
        max_results: usize,
        min_similarity: f64,
    ) -> Vec<RetrievalResult>;
}
