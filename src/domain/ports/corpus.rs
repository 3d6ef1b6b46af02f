use crate::domain::{errors::DomainError, DocumentCorpus};
use async_trait::async_trait;

/// Ingestion collaborator that produces the document corpus.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    async fn load(&self) -> Result<DocumentCorpus, DomainError>;
}
