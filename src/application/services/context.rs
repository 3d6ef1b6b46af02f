use crate::domain::{ContextDocument, DocumentCorpus, RetrievalResult};

/// Selects the retrieved documents that go into the generation prompt.
///
/// Documents are taken in rank order while their combined text stays within
/// `max_chars`. The top document is always kept, truncated if it alone is over
/// budget. Results whose document is no longer in the corpus are skipped.
#[derive(Debug, Clone, Copy)]
pub struct ContextLimiter {
    max_chars: usize,
}

impl ContextLimiter {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn build(
        &self,
        results: &[RetrievalResult],
        corpus: &DocumentCorpus,
    ) -> Vec<ContextDocument> {
        let mut selected = Vec::new();
        let mut used = 0usize;

        for result in results {
            let Some(doc) = corpus.get(&result.document_id) else {
                continue;
            };
            let len = doc.text.chars().count();

            let text = if used + len <= self.max_chars {
                doc.text.clone()
            } else if selected.is_empty() {
                truncate_chars(&doc.text, self.max_chars)
            } else {
                break;
            };

            used += text.chars().count();
            selected.push(ContextDocument {
                document_id: result.document_id.clone(),
                text,
                similarity: result.similarity,
            });
        }

        if selected.len() < results.len() {
            tracing::debug!(
                kept = selected.len(),
                retrieved = results.len(),
                max_chars = self.max_chars,
                "context limited"
            );
        }
        selected
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
