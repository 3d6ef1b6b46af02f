mod hybrid;
mod lexical;
mod linear;

pub use hybrid::{HybridRetriever, HybridWeights};
pub use lexical::LexicalIndex;
pub use linear::LinearRetriever;

use std::cmp::Ordering;

use crate::domain::{EmbeddingRecord, RetrievalResult};

/// Turns `(record position, score)` pairs into ranked results: drops scores
/// under `min_similarity`, sorts descending (stable, so ties keep insertion
/// order), keeps `max_results` and numbers them from 1.
fn rank(
    scored: impl IntoIterator<Item = (usize, f64)>,
    records: &[EmbeddingRecord],
    max_results: usize,
    min_similarity: f64,
) -> Vec<RetrievalResult> {
    if max_results == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f64)> = scored
        .into_iter()
        .filter(|(_, score)| *score >= min_similarity)
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(max_results)
        .enumerate()
        .map(|(i, (position, similarity))| RetrievalResult {
            document_id: records[position].document_id.clone(),
            similarity,
            rank: i + 1,
        })
        .collect()
}
