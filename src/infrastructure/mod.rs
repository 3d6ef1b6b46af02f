pub mod cache;
pub mod capability;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod llm;
pub mod logging;
pub mod retrieval;

pub use cache::VectorCache;
pub use config::{AppConfig, Config, LlmProvider, PromptsConfig, RetrievalMode};
pub use corpus::JsonCorpusSource;
pub use embedding::OpenAiEmbedding;
pub use llm::{AnthropicGeneration, OpenAiGeneration};
pub use retrieval::{HybridRetriever, HybridWeights, LinearRetriever};
