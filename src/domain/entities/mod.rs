mod answer;
mod cache;
mod document;
mod embedding;

pub use answer::{
    AnswerOutcome, ContextDocument, GenerationRequest, RetrievalQuery, RetrievalResult,
};
pub use cache::{CacheStatus, ReconcileReport};
pub use document::{fingerprint, Document, DocumentCorpus};
pub use embedding::{Embedding, EmbeddingRecord};
