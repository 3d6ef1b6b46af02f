pub mod answer;
pub mod context;
pub mod embedding_manager;

pub use answer::{AnswerOrchestrator, ConfidenceScorer, QuestionLimits, RetrievalSettings};
pub use context::ContextLimiter;
pub use embedding_manager::EmbeddingManager;
