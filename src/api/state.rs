use std::sync::Arc;

use crate::application::{AnswerOrchestrator, EmbeddingManager};
use crate::domain::DocumentCorpus;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub embeddings: Arc<EmbeddingManager>,
    pub answers: Arc<AnswerOrchestrator>,
    pub corpus: Arc<DocumentCorpus>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        embeddings: Arc<EmbeddingManager>,
        answers: Arc<AnswerOrchestrator>,
        corpus: Arc<DocumentCorpus>,
        config: AppConfig,
    ) -> Self {
        Self {
            embeddings,
            answers,
            corpus,
            config: Arc::new(config),
        }
    }
}
