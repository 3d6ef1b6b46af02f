use crate::domain::{ports::Retriever, EmbeddingRecord, RetrievalQuery, RetrievalResult};
use crate::infrastructure::retrieval::rank;

/// Exhaustive cosine-similarity scan, O(entries x dimension) per query.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRetriever;

impl Retriever for LinearRetriever {
    fn retrieve(
        &self,
        query: &RetrievalQuery<'_>,
        records: &[EmbeddingRecord],
        max_results: usize,
        min_similarity: f64,
    ) -> Vec<RetrievalResult> {
        let scored = records
            .iter()
            .enumerate()
            .map(|(i, record)| (i, query.embedding.cosine_similarity(&record.vector)));
        rank(scored, records, max_results, min_similarity)
    }
}
