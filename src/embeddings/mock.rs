//! Deterministic in-process providers for tests and offline wiring.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use super::EmbeddingProvider;
use crate::types::PipelineError;

const MOCK_DIMENSIONS: usize = 64;

/// Deterministic, network-free provider.
///
/// Identical inputs always produce identical vectors, different inputs
/// (almost surely) different ones, so similarity-sensitive behavior can be
/// tested without a remote service.
#[derive(Clone, Debug, Default)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self {
            dimensions: MOCK_DIMENSIONS,
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, input: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        input.hash(&mut hasher);
        let mut state = hasher.finish() | 1;

        let mut vector = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            // xorshift over the text hash keeps the output reproducible.
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            vector.push((state as f32 / u64::MAX as f32) * 2.0 - 1.0);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, PipelineError> {
        Ok(self.vector_for(input))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Provider that refuses every request; useful as an explicit "not
/// configured" placeholder.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEmbeddingProvider;

impl NullEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed(&self, _input: &str) -> Result<Vec<f32>, PipelineError> {
        Err(PipelineError::Embedding(
            "no embedding provider configured".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
