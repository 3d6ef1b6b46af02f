//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) and the vector cache rather
//! than on concrete providers, so tests can drive them with in-process fakes.

pub mod retry;
pub mod services;

pub use retry::RetryPolicy;
pub use services::{
    AnswerOrchestrator, ConfidenceScorer, ContextLimiter, EmbeddingManager, QuestionLimits,
    RetrievalSettings,
};
