use crate::domain::{errors::DomainError, GenerationRequest};
use async_trait::async_trait;

#[async_trait]
pub trait GenerationProducer: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DomainError>;
}
