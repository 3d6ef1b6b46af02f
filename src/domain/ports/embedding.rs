use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

/// Remote text-to-vector capability.
///
/// Failures surface as `DomainError::Capability`; the `transient` flag decides
/// whether callers retry.
#[async_trait]
pub trait EmbeddingProducer: Send + Sync {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError>;

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::permanent("No embedding returned"))
    }

    fn model_name(&self) -> &str;
    fn dimension(&self) -> usize;
}
