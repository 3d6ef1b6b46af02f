//! Scriptable in-process capabilities for unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::ports::{EmbeddingProducer, GenerationProducer};
use crate::domain::{DomainError, Embedding, GenerationRequest};

pub const FAKE_MODEL: &str = "fake-embed";
pub const FAKE_DIMENSION: usize = 4;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transient,
    Permanent,
}

impl Failure {
    fn error(self, msg: &str) -> DomainError {
        match self {
            Self::Transient => DomainError::transient(msg),
            Self::Permanent => DomainError::permanent(msg),
        }
    }
}

#[derive(Default)]
pub struct FakeEmbedding {
    vectors: HashMap<String, Vec<f64>>,
    fail_always: Option<Failure>,
    failing_texts: HashSet<String>,
    transient_failures_left: AtomicUsize,
    wrong_dimension: bool,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl FakeEmbedding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f64>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.fail_always = Some(failure);
        self
    }

    /// Any batch containing `text` fails permanently.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing_texts.insert(text.to_string());
        self
    }

    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_wrong_dimension(mut self) -> Self {
        self.wrong_dimension = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    /// Deterministic fallback vector for texts without an explicit mapping.
    pub fn vector_for(&self, text: &str) -> Vec<f64> {
        if let Some(v) = self.vectors.get(text) {
            return v.clone();
        }
        let sum: u32 = text.bytes().map(u32::from).sum();
        vec![
            1.0,
            text.len() as f64,
            f64::from(sum % 97),
            f64::from(text.bytes().next().unwrap_or(0)),
        ]
    }
}

#[async_trait]
impl EmbeddingProducer for FakeEmbedding {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .unwrap()
            .push(texts.iter().map(|t| t.to_string()).collect());

        if let Some(failure) = self.fail_always {
            return Err(failure.error("scripted failure"));
        }
        if texts.iter().any(|t| self.failing_texts.contains(*t)) {
            return Err(Failure::Permanent.error("scripted batch failure"));
        }
        if self
            .transient_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Failure::Transient.error("scripted transient failure"));
        }

        Ok(texts
            .iter()
            .map(|t| {
                let mut v = self.vector_for(t);
                if self.wrong_dimension {
                    v.push(0.0);
                }
                Embedding::new(v)
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        FAKE_MODEL
    }

    fn dimension(&self) -> usize {
        FAKE_DIMENSION
    }
}

#[derive(Default)]
pub struct FakeGeneration {
    fail_always: Option<Failure>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.fail_always = Some(failure);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProducer for FakeGeneration {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(failure) = self.fail_always {
            return Err(failure.error("scripted generation failure"));
        }
        Ok(format!(
            "answer to '{}' from {} documents",
            request.question,
            request.context.len()
        ))
    }
}
