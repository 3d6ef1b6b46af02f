use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::{services::ContextLimiter, RetryPolicy};
use crate::domain::{
    ports::{EmbeddingProducer, GenerationProducer, Retriever},
    AnswerOutcome, CancellationToken, DocumentCorpus, DomainError, EmbeddingRecord,
    GenerationRequest, RetrievalQuery, RetrievalResult,
};
use crate::infrastructure::VectorCache;

/// Accepted question length, in characters after trimming.
#[derive(Debug, Clone, Copy)]
pub struct QuestionLimits {
    pub min_length: usize,
    pub max_length: usize,
}

impl QuestionLimits {
    /// Returns the trimmed question, or a `Validation` error describing why it
    /// cannot be answered.
    pub fn validate<'a>(&self, question: &'a str) -> Result<&'a str, DomainError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("question must not be empty"));
        }

        let len = trimmed.chars().count();
        if len < self.min_length {
            return Err(DomainError::validation(format!(
                "question must be at least {} characters",
                self.min_length
            )));
        }
        if len > self.max_length {
            return Err(DomainError::validation(format!(
                "question must be at most {} characters",
                self.max_length
            )));
        }
        if !trimmed.chars().any(char::is_alphanumeric) {
            return Err(DomainError::validation(
                "question must contain letters or digits",
            ));
        }
        if trimmed.chars().all(char::is_numeric) {
            return Err(DomainError::validation("question must not be only digits"));
        }
        Ok(trimmed)
    }
}

impl Default for QuestionLimits {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    pub max_results: usize,
    pub min_similarity: f64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            min_similarity: 0.7,
        }
    }
}

/// Confidence is the top similarity clamped to [0, 1] when sources were used,
/// and `default_confidence` when the model answered without context.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    pub default_confidence: f64,
}

impl ConfidenceScorer {
    pub fn score(&self, similarities: &[f64]) -> f64 {
        similarities
            .iter()
            .copied()
            .reduce(f64::max)
            .map_or(self.default_confidence, |top| top.clamp(0.0, 1.0))
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self {
            default_confidence: 0.3,
        }
    }
}

/// Answers one question end to end:
/// validate, embed the question, retrieve from the cache, generate.
///
/// Never fails past its boundary; every path ends in an `AnswerOutcome`.
/// The cache is only read, so any number of questions may run concurrently,
/// including during a reconciliation pass.
pub struct AnswerOrchestrator {
    embedding: Arc<dyn EmbeddingProducer>,
    generation: Arc<dyn GenerationProducer>,
    retriever: Arc<dyn Retriever>,
    cache: Arc<VectorCache>,
    corpus: Arc<DocumentCorpus>,
    retry: RetryPolicy,
    limits: QuestionLimits,
    retrieval: RetrievalSettings,
    confidence: ConfidenceScorer,
    context: ContextLimiter,
}

impl AnswerOrchestrator {
    pub fn new(
        embedding: Arc<dyn EmbeddingProducer>,
        generation: Arc<dyn GenerationProducer>,
        retriever: Arc<dyn Retriever>,
        cache: Arc<VectorCache>,
        corpus: Arc<DocumentCorpus>,
    ) -> Self {
        Self {
            embedding,
            generation,
            retriever,
            cache,
            corpus,
            retry: RetryPolicy::default(),
            limits: QuestionLimits::default(),
            retrieval: RetrievalSettings::default(),
            confidence: ConfidenceScorer::default(),
            context: ContextLimiter::new(16_000),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_limits(mut self, limits: QuestionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalSettings) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_default_confidence(mut self, default_confidence: f64) -> Self {
        self.confidence = ConfidenceScorer {
            default_confidence: default_confidence.clamp(0.0, 1.0),
        };
        self
    }

    pub fn with_max_context_chars(mut self, max_chars: usize) -> Self {
        self.context = ContextLimiter::new(max_chars);
        self
    }

    pub async fn answer(&self, question: &str) -> AnswerOutcome {
        self.answer_with_cancellation(question, &CancellationToken::new())
            .await
    }

    #[instrument(skip(self, question, cancel), fields(question_id = %Uuid::new_v4()))]
    pub async fn answer_with_cancellation(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> AnswerOutcome {
        let started = Instant::now();

        let question = match self.limits.validate(question) {
            Ok(q) => q,
            Err(DomainError::Validation(reason)) => {
                info!(%reason, "question rejected");
                return AnswerOutcome::validation(reason);
            }
            Err(other) => return AnswerOutcome::validation(other.to_string()),
        };

        match self.process(question, cancel).await {
            Ok((answer, results)) => {
                let processing_time_ms = started.elapsed().as_millis() as u64;
                let similarity_scores: Vec<f64> = results.iter().map(|r| r.similarity).collect();
                let confidence = self.confidence.score(&similarity_scores);

                info!(
                    retrieved = results.len(),
                    confidence,
                    processing_time_ms,
                    "question answered"
                );
                AnswerOutcome::Success {
                    answer,
                    confidence,
                    processing_time_ms,
                    sources: results.into_iter().map(|r| r.document_id).collect(),
                    retrieved_count: similarity_scores.len(),
                    similarity_scores,
                }
            }
            Err(DomainError::Cancelled) => {
                info!("question cancelled");
                AnswerOutcome::processing("question was cancelled")
            }
            Err(e) => {
                warn!(error = %e, "question failed");
                match e {
                    DomainError::Processing(reason) => AnswerOutcome::processing(reason),
                    other => AnswerOutcome::processing(other.to_string()),
                }
            }
        }
    }

    async fn process(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<(String, Vec<RetrievalResult>), DomainError> {
        let embedding = &self.embedding;
        let query = self
            .retry
            .run("embed_query", cancel, move || embedding.embed(question))
            .await
            .map_err(|e| stage_failed("query embedding", e))?;

        if query.dimension() != self.cache.dimension() {
            return Err(DomainError::processing(format!(
                "query embedding has dimension {}, cache expects {}",
                query.dimension(),
                self.cache.dimension()
            )));
        }

        let RetrievalSettings {
            max_results,
            min_similarity,
        } = self.retrieval;
        let query = RetrievalQuery::new(question, &query);
        let results = self.cache.with_records(|records| {
            // Entries whose document left the corpus stay cached until the
            // next reconciliation; they must not be cited as sources.
            let is_live = |r: &EmbeddingRecord| self.corpus.contains(&r.document_id);
            let live: Vec<EmbeddingRecord>;
            let records = if records.iter().all(is_live) {
                records
            } else {
                live = records.iter().filter(|r| is_live(r)).cloned().collect();
                live.as_slice()
            };
            self.retriever
                .retrieve(&query, records, max_results, min_similarity)
        });
        debug!(retrieved = results.len(), "retrieval done");

        let request = GenerationRequest::new(question, self.context.build(&results, &self.corpus));
        let request = &request;
        let generation = &self.generation;
        let answer = self
            .retry
            .run("generate", cancel, move || generation.generate(request))
            .await
            .map_err(|e| stage_failed("generation", e))?;

        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        Ok((answer, results))
    }
}

fn stage_failed(stage: &str, error: DomainError) -> DomainError {
    match error {
        DomainError::Cancelled => DomainError::Cancelled,
        other => DomainError::processing(format!("{stage} failed: {other}")),
    }
}
