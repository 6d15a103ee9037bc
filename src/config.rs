//! Pipeline configuration and embedding-service credentials.

use serde::{Deserialize, Serialize};

/// Default tokenizer/chat model identifier.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default remote embedding model identifier.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// What to do with a single sentence whose own token count already exceeds
/// the chunk budget.
///
/// The two behaviors historically lived on separate code paths; they are
/// unified here behind one explicit policy selected by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OversizedSentencePolicy {
    /// Drop the sentence entirely; it is never emitted in any chunk and does
    /// not contribute to the running total.
    Skip,
    /// Emit the sentence as its own one-sentence chunk exceeding the budget.
    #[default]
    KeepOversized,
}

/// Knobs controlling splitting, packing, and grouping.
///
/// Construct with struct-update syntax:
///
/// ```
/// use chunkmill::config::ChunkingConfig;
///
/// let config = ChunkingConfig {
///     max_tokens: 100,
///     threshold: 0.75,
///     ..Default::default()
/// };
/// assert_eq!(config.minimal_length, 50);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Model identifier used to select the tokenizer encoding.
    pub model: String,
    /// Maximum tokens per chunk.
    pub max_tokens: usize,
    /// Semantic similarity cutoff for merging adjacent chunks.
    pub threshold: f32,
    /// Naive-splitter sentence floor: fragments at or below this many
    /// characters are dropped.
    pub minimal_length: usize,
    /// Handling of sentences that alone exceed `max_tokens`.
    pub policy: OversizedSentencePolicy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 120,
            threshold: 0.8,
            minimal_length: 50,
            policy: OversizedSentencePolicy::default(),
        }
    }
}

/// Authentication material for the remote embedding service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub organization: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            organization: None,
        }
    }

    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Sources credentials from `OPENAI_API_KEY` / `OPENAI_ORG_ID`.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            organization: std::env::var("OPENAI_ORG_ID").ok(),
        }
    }
}
