//! Embedding providers and vector similarity helpers.

mod mock;
mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::PipelineError;

pub use mock::{MockEmbeddingProvider, NullEmbeddingProvider};
pub use openai::OpenAiEmbeddingProvider;

/// Shared handle to a provider, cloneable across pipeline stages and tasks.
pub type SharedEmbeddingProvider = Arc<dyn EmbeddingProvider>;

/// Produces fixed-length embedding vectors for text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single input.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, PipelineError>;

    /// Embeds several inputs, returning vectors in input order.
    ///
    /// The default issues one request per input; providers with a batch
    /// endpoint should override this.
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let mut vectors = Vec::with_capacity(inputs.len());
        for input in inputs {
            vectors.push(self.embed(input).await?);
        }
        Ok(vectors)
    }

    /// Short provider name for logging.
    fn name(&self) -> &'static str;
}

/// Cosine similarity between two vectors; `0.0` when either norm is zero or
/// the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
