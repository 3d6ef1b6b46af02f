//! Wiring shared by the `api` and `reconcile` binaries.

use std::sync::Arc;
use tracing::info;

use crate::application::{AnswerOrchestrator, EmbeddingManager, RetrievalSettings};
use crate::domain::ports::{CorpusSource, EmbeddingProducer, GenerationProducer, Retriever};
use crate::domain::{DocumentCorpus, DomainError};
use crate::infrastructure::{
    AnthropicGeneration, AppConfig, Config, HybridRetriever, JsonCorpusSource, LinearRetriever,
    LlmProvider, OpenAiEmbedding, OpenAiGeneration, RetrievalMode, VectorCache,
};

/// Everything needed to keep the embedding cache in step with the corpus.
pub struct EmbeddingServices {
    pub corpus: Arc<DocumentCorpus>,
    pub producer: Arc<dyn EmbeddingProducer>,
    pub cache: Arc<VectorCache>,
    pub manager: Arc<EmbeddingManager>,
}

pub async fn embedding_services(config: &Config) -> anyhow::Result<EmbeddingServices> {
    let source = JsonCorpusSource::new(&config.corpus.path);
    let corpus = Arc::new(source.load().await?);
    info!(
        path = %source.path().display(),
        documents = corpus.len(),
        "corpus loaded"
    );

    let producer: Arc<dyn EmbeddingProducer> =
        Arc::new(OpenAiEmbedding::from_config(&config.embedding)?);

    let embedding = &config.embedding;
    let cache_path = VectorCache::path_for(&config.cache.dir, &embedding.model);
    let cache = VectorCache::load(cache_path, &embedding.model, embedding.dimension)
        .await;
    ensure_compatible(producer.as_ref(), &cache)?;
    let cache = Arc::new(cache);

    let manager = Arc::new(EmbeddingManager::new(
        producer.clone(),
        cache.clone(),
        config.retry.policy(),
        config.embedding.batch_size,
    ));

    Ok(EmbeddingServices {
        corpus,
        producer,
        cache,
        manager,
    })
}

/// Records written by `producer` must match the cache's model and dimension.
fn ensure_compatible(
    producer: &dyn EmbeddingProducer,
    cache: &VectorCache,
) -> Result<(), DomainError> {
    if producer.model_name() != cache.model_name() || producer.dimension() != cache.dimension() {
        return Err(DomainError::validation(format!(
            "embedding producer {} ({}d) does not match cache {} ({}d)",
            producer.model_name(),
            producer.dimension(),
            cache.model_name(),
            cache.dimension()
        )));
    }
    Ok(())
}

pub fn generation_producer(config: &AppConfig) -> anyhow::Result<Arc<dyn GenerationProducer>> {
    let llm = &config.config.llm;
    let producer: Arc<dyn GenerationProducer> = match llm.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiGeneration::from_config(llm, &config.prompts)?),
        LlmProvider::Anthropic => {
            Arc::new(AnthropicGeneration::from_config(llm, &config.prompts)?)
        }
    };
    info!(provider = ?llm.provider, model = %llm.model, "generation provider ready");
    Ok(producer)
}

pub fn answer_orchestrator(
    services: &EmbeddingServices,
    generation: Arc<dyn GenerationProducer>,
    config: &Config,
) -> Result<AnswerOrchestrator, DomainError> {
    let retriever: Arc<dyn Retriever> = match config.rag.retrieval {
        RetrievalMode::Semantic => Arc::new(LinearRetriever),
        RetrievalMode::Hybrid => {
            let weights = config.rag.hybrid_weights()?;
            Arc::new(HybridRetriever::new(&services.corpus, weights))
        }
    };
    info!(mode = ?config.rag.retrieval, "retriever ready");

    let orchestrator = AnswerOrchestrator::new(
        services.producer.clone(),
        generation,
        retriever,
        services.cache.clone(),
        services.corpus.clone(),
    )
    .with_retry(config.retry.policy())
    .with_limits(config.question.limits())
    .with_retrieval(RetrievalSettings {
        max_results: config.rag.max_results,
        min_similarity: config.rag.similarity_threshold,
    })
    .with_default_confidence(config.rag.default_confidence)
    .with_max_context_chars(config.rag.max_context_chars);
    Ok(orchestrator)
}
