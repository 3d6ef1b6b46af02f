mod json;

pub use json::JsonCorpusSource;
