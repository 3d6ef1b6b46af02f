mod corpus;
mod embedding;
mod generation;
mod retriever;

pub use corpus::CorpusSource;
pub use embedding::EmbeddingProducer;
pub use generation::GenerationProducer;
pub use retriever::Retriever;
