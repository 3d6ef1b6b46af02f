//! TF-IDF index over the corpus text for keyword overlap scoring.

use std::collections::{HashMap, HashSet};

use crate::domain::DocumentCorpus;

/// Sparse, L2-normalised TF-IDF vector keyed by term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector(HashMap<String, f64>);

impl TermVector {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cosine similarity; both sides are already unit length.
    fn dot(&self, other: &TermVector) -> f64 {
        let (small, large) = if self.0.len() <= other.0.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        small
            .iter()
            .filter_map(|(term, w)| large.get(term).map(|v| w * v))
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }
}

/// Vocabulary and per-document vectors, fitted once on the corpus.
///
/// Terms are lowercase alphabetic words of at least two letters minus English
/// stop words, plus bigrams of adjacent kept words. IDF is smoothed,
/// `ln((1 + n) / (1 + df)) + 1`, so no term weighs zero.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    idf: HashMap<String, f64>,
    documents: HashMap<String, TermVector>,
}

impl LexicalIndex {
    pub fn build(corpus: &DocumentCorpus) -> Self {
        let tokenized: Vec<(&str, Vec<String>)> = corpus
            .unique_documents()
            .map(|doc| (doc.id.as_str(), terms(&doc.text)))
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for (_, terms) in &tokenized {
            let unique: HashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = tokenized.len() as f64;
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, count)| {
                let weight = ((1.0 + n_docs) / (1.0 + count as f64)).ln() + 1.0;
                (term.to_string(), weight)
            })
            .collect();

        let mut index = Self {
            idf,
            documents: HashMap::new(),
        };
        let documents = tokenized
            .iter()
            .map(|(id, terms)| (id.to_string(), index.weigh(terms)))
            .collect();
        index.documents = documents;
        index
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Vectorises free text against the fitted vocabulary. Unknown terms are
    /// ignored.
    pub fn vectorize(&self, text: &str) -> TermVector {
        self.weigh(&terms(text))
    }

    /// Similarity in [0, 1] between a query vector and an indexed document;
    /// zero for documents the index has never seen.
    pub fn similarity(&self, query: &TermVector, document_id: &str) -> f64 {
        self.documents
            .get(document_id)
            .map_or(0.0, |doc| query.dot(doc))
    }

    fn weigh(&self, terms: &[String]) -> TermVector {
        let mut tf: HashMap<&str, f64> = HashMap::new();
        for term in terms {
            if self.idf.contains_key(term) {
                *tf.entry(term.as_str()).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: HashMap<String, f64> = tf
            .into_iter()
            .map(|(term, count)| (term.to_string(), count * self.idf[term]))
            .collect();

        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            weights.values_mut().for_each(|w| *w /= norm);
        }
        TermVector(weights)
    }
}

fn terms(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphabetic())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 2 && !is_stop_word(w))
        .collect();

    let bigrams: Vec<String> = words
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect();
    words.into_iter().chain(bigrams).collect()
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "do", "does", "for",
    "from", "had", "has", "have", "how", "if", "in", "into", "is", "it", "its", "of", "on", "or",
    "our", "so", "than", "that", "the", "their", "then", "there", "these", "they", "this", "to",
    "was", "we", "were", "what", "when", "where", "which", "who", "why", "will", "with", "you",
    "your",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Document;

    fn index() -> LexicalIndex {
        LexicalIndex::build(&DocumentCorpus::new(vec![
            Document::new("refunds", "Refunds are issued within five business days.")
                .unwrap(),
            Document::new("shipping", "Express shipping takes two business days.")
                .unwrap(),
            Document::new("hours", "Support is open on weekdays.")
                .unwrap(),
        ]))
    }

    #[test]
    fn test_terms_drop_stop_words_and_add_bigrams() {
        let terms = terms("How are the Refunds issued? 5 days!");
        assert_eq!(
            terms,
            vec!["refunds", "issued", "days", "refunds issued", "issued days"]
        );
    }

    #[test]
    fn test_matching_document_scores_highest() {
        let index = index();
        let query = index.vectorize("When are refunds issued?");

        let refunds = index.similarity(&query, "refunds");
        let shipping = index.similarity(&query, "shipping");
        let hours = index.similarity(&query, "hours");

        assert!(refunds > shipping);
        assert_eq!(hours, 0.0);
        assert!((0.0..=1.0).contains(&refunds));
    }

    #[test]
    fn test_identical_text_scores_one() {
        let index = index();
        let query = index.vectorize("Support is open on weekdays.");
        assert!((index.similarity(&query, "hours") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_terms_and_documents_score_zero() {
        let index = index();
        let query = index.vectorize("quantum chromodynamics");

        assert!(query.is_empty());
        assert_eq!(index.similarity(&query, "refunds"), 0.0);
        let known = index.vectorize("refunds");
        assert_eq!(index.similarity(&known, "missing"), 0.0);
    }

    #[test]
    fn test_empty_corpus_builds_empty_index() {
        let index = LexicalIndex::build(&DocumentCorpus::default());
        assert!(index.is_empty());
        assert!(index.vectorize("anything").is_empty());
    }
}
