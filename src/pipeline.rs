//! The composed text-to-embeddings pipeline.
//!
//! [`TextPipeline`] is an immutable service: every stage consumes its input
//! and returns a new owned value, so stages can be tested and composed
//! independently. There is no processor object that progressively rewrites
//! its own state.

use std::sync::Arc;

use crate::chunker::{pack_sentences, ChunkerOptions};
use crate::config::{ChunkingConfig, Credentials, OversizedSentencePolicy};
use crate::embeddings::{NullEmbeddingProvider, OpenAiEmbeddingProvider, SharedEmbeddingProvider};
use crate::fetcher::{EmbeddingFetcher, FetchMode};
use crate::grouper::SemanticGrouper;
use crate::segmenter::{naive_split, SentenceSplitter};
use crate::tokenizer::Tokenizer;
use crate::types::{Chunk, ChunkTable, PipelineError, Segment};

/// Accepted pipeline inputs.
pub enum PipelineInput {
    /// Raw text; runs the full split → chunk → group → embed pipeline.
    Text(String),
    /// Pre-split chunk texts; token counts are measured, then the grouping
    /// and embedding stages run.
    PreChunked(Vec<String>),
    /// A pre-built table; only the embedding stage runs.
    Table(ChunkTable),
}

/// Splits, chunks, groups, and embeds text into a [`ChunkTable`].
pub struct TextPipeline {
    config: ChunkingConfig,
    splitter: SentenceSplitter,
    provider: SharedEmbeddingProvider,
    fetch_mode: FetchMode,
    concurrency_limit: Option<usize>,
}

impl TextPipeline {
    pub fn builder() -> TextPipelineBuilder {
        TextPipelineBuilder::default()
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Breaks raw text into ordered sentences.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.splitter.split(text)
    }

    /// Packs sentences into token-bounded chunks.
    pub fn chunk(&self, sentences: &[String]) -> Result<Vec<Chunk>, PipelineError> {
        let tokenizer = Tokenizer::for_model(&self.config.model)?;
        let options = ChunkerOptions {
            max_tokens: self.config.max_tokens,
            policy: self.config.policy,
            separator: " ".to_string(),
        };
        Ok(pack_sentences(sentences, &tokenizer, &options))
    }

    /// Merges adjacent semantically similar chunks into segments.
    pub async fn group(&self, chunks: &[Chunk]) -> Result<Vec<Segment>, PipelineError> {
        SemanticGrouper::new(Arc::clone(&self.provider), self.config.threshold)
            .group(chunks)
            .await
    }

    /// Fetches one embedding per row and attaches it, preserving order.
    pub async fn embed(&self, table: ChunkTable) -> Result<ChunkTable, PipelineError> {
        let mut fetcher = EmbeddingFetcher::new(Arc::clone(&self.provider)).with_mode(self.fetch_mode);
        if let Some(limit) = self.concurrency_limit {
            fetcher = fetcher.with_concurrency_limit(limit);
        }
        fetcher.attach(table).await
    }

    /// Runs every stage up to (but not including) embedding retrieval.
    pub async fn prepare(&self, input: PipelineInput) -> Result<ChunkTable, PipelineError> {
        match input {
            PipelineInput::Text(text) => {
                let sentences = self.split(&text);
                let chunks = self.chunk(&sentences)?;
                tracing::debug!(
                    sentences = sentences.len(),
                    chunks = chunks.len(),
                    "chunked input text"
                );
                let segments = self.group(&chunks).await?;
                Ok(ChunkTable::from(segments))
            }
            PipelineInput::PreChunked(texts) => {
                let tokenizer = Tokenizer::for_model(&self.config.model)?;
                let chunks: Vec<Chunk> = texts
                    .into_iter()
                    .map(|text| {
                        let token_count = tokenizer.count(&text);
                        Chunk::new(text, token_count)
                    })
                    .collect();
                let segments = self.group(&chunks).await?;
                Ok(ChunkTable::from(segments))
            }
            PipelineInput::Table(table) => Ok(table),
        }
    }

    /// Runs the full pipeline and returns the embedded table.
    pub async fn run(&self, input: PipelineInput) -> Result<ChunkTable, PipelineError> {
        let table = self.prepare(input).await?;
        let embedded = self.embed(table).await?;
        let stats = embedded.stats();
        tracing::info!(
            rows = stats.rows,
            average_tokens = stats.average_tokens,
            "pipeline complete"
        );
        Ok(embedded)
    }
}

/// Builder for [`TextPipeline`].
pub struct TextPipelineBuilder {
    config: ChunkingConfig,
    splitter: SentenceSplitter,
    provider: Option<SharedEmbeddingProvider>,
    fetch_mode: FetchMode,
    concurrency_limit: Option<usize>,
}

impl Default for TextPipelineBuilder {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
            splitter: SentenceSplitter::default(),
            provider: None,
            fetch_mode: FetchMode::default(),
            concurrency_limit: None,
        }
    }
}

impl TextPipelineBuilder {
    #[must_use]
    pub fn with_config(mut self, config: ChunkingConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_splitter(mut self, splitter: SentenceSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    #[must_use]
    pub fn with_embedding_provider(mut self, provider: SharedEmbeddingProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// Builds the pipeline. Without an explicit provider the pipeline wires
    /// in [`NullEmbeddingProvider`], which fails loudly on first use.
    pub fn build(self) -> TextPipeline {
        TextPipeline {
            config: self.config,
            splitter: self.splitter,
            provider: self
                .provider
                .unwrap_or_else(|| Arc::new(NullEmbeddingProvider::new())),
            fetch_mode: self.fetch_mode,
            concurrency_limit: self.concurrency_limit,
        }
    }
}

/// One-shot naive path: delimiter split, `Skip` policy, `". "` joining.
///
/// Chunk texts are reconstituted sentence-style (terminal period restored),
/// so `"A. B. C."` with a zero floor comes back as a single `"A. B. C."`
/// row whose token count is the sum of its members' counts.
pub fn naive_chunk_table(
    text: &str,
    model: &str,
    max_tokens: usize,
    minimal_length: usize,
) -> Result<ChunkTable, PipelineError> {
    let tokenizer = Tokenizer::for_model(model)?;
    let sentences = naive_split(text, minimal_length);
    let options = ChunkerOptions {
        max_tokens,
        policy: OversizedSentencePolicy::Skip,
        separator: ". ".to_string(),
    };
    let chunks: Vec<Chunk> = pack_sentences(&sentences, &tokenizer, &options)
        .into_iter()
        .map(|mut chunk| {
            if !chunk.text.ends_with('.') {
                chunk.text.push('.');
            }
            chunk
        })
        .collect();
    Ok(ChunkTable::from(chunks))
}

/// Naive chunking straight to embeddings against the remote service,
/// issuing requests sequentially.
pub async fn naive_text_to_embeddings(
    text: &str,
    model: &str,
    max_tokens: usize,
    minimal_length: usize,
    credentials: Credentials,
) -> Result<ChunkTable, PipelineError> {
    let table = naive_chunk_table(text, model, max_tokens, minimal_length)?;
    let provider: SharedEmbeddingProvider = Arc::new(OpenAiEmbeddingProvider::new(credentials)?);
    EmbeddingFetcher::new(provider)
        .with_mode(FetchMode::Sequential)
        .attach(table)
        .await
}
