//! Embedding cache and retrieval-augmented question answering.

pub mod api;
pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod testing;
