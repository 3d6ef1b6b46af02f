use serde::{Deserialize, Serialize};

use crate::domain::Embedding;

/// A question as the retriever sees it: the raw text and its embedding.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalQuery<'a> {
    pub text: &'a str,
    pub embedding: &'a Embedding,
}

impl<'a> RetrievalQuery<'a> {
    pub fn new(text: &'a str, embedding: &'a Embedding) -> Self {
        Self { text, embedding }
    }
}

/// One ranked hit from the retriever. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub document_id: String,
    pub similarity: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub document_id: String,
    pub text: String,
    pub similarity: f64,
}

/// Everything the generation capability needs for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub question: String,
    pub context: Vec<ContextDocument>,
}

impl GenerationRequest {
    pub fn new(question: impl Into<String>, context: Vec<ContextDocument>) -> Self {
        Self {
            question: question.into(),
            context,
        }
    }

    pub fn has_context(&self) -> bool {
        !self.context.is_empty()
    }
}

/// Terminal state of a question. Every call to the orchestrator ends in
/// exactly one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Success {
        answer: String,
        confidence: f64,
        processing_time_ms: u64,
        sources: Vec<String>,
        retrieved_count: usize,
        similarity_scores: Vec<f64>,
    },
    ValidationError {
        reason: String,
    },
    ProcessingError {
        reason: String,
    },
}

impl AnswerOutcome {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationError {
            reason: reason.into(),
        }
    }

    pub fn processing(reason: impl Into<String>) -> Self {
        Self::ProcessingError {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
