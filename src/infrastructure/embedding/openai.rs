use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingModel;
use rig::providers::openai;
use std::time::Duration;
use tracing::instrument;

use crate::domain::{ports::EmbeddingProducer, DomainError, Embedding};
use crate::infrastructure::capability::{classify, with_timeout};
use crate::infrastructure::config::EmbeddingConfig;

pub struct OpenAiEmbedding {
    client: openai::Client,
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl OpenAiEmbedding {
    /// Reads `OPENAI_API_KEY` from the environment.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, DomainError> {
        if std::env::var("OPENAI_API_KEY").map_or(true, |k| k.trim().is_empty()) {
            return Err(DomainError::validation("OPENAI_API_KEY is not set"));
        }

        Ok(Self {
            client: openai::Client::from_env(),
            model: config.model.clone(),
            dimension: config.dimension,
            timeout: config.timeout(),
        })
    }
}

#[async_trait]
impl EmbeddingProducer for OpenAiEmbedding {
    #[instrument(skip(self, texts), fields(model = %self.model, count = texts.len()))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.client.embedding_model(&self.model);
        let inputs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();

        let embeddings = with_timeout("embedding", self.timeout, async {
            model
                .embed_texts(inputs)
                .await
                .map_err(|e| classify("embedding", e))
        })
        .await?;

        Ok(embeddings
            .into_iter()
            .map(|emb| Embedding::new(emb.vec))
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
