//! Token-bounded and semantic text chunking with embedding retrieval.
//!
//! ```text
//! Raw text ──► segmenter (linguistic / naive) ──► sentences
//!
//! sentences ──► chunker (greedy, token budget) ──► chunks (+token counts)
//!
//! chunks ──► grouper (pivot similarity) ──► segments ──► ChunkTable
//!
//! ChunkTable ──► fetcher (sequential / fan-out) ──► rows with embeddings
//! ```
//!
//! Data flows strictly left to right; every stage returns a new owned value,
//! so stages compose and test independently. [`pipeline::TextPipeline`] wires
//! the stages together behind a builder.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod fetcher;
pub mod grouper;
pub mod pipeline;
pub mod segmenter;
pub mod tokenizer;
pub mod types;

pub use chunker::{pack_sentences, ChunkerOptions};
pub use config::{ChunkingConfig, Credentials, OversizedSentencePolicy};
pub use embeddings::{
    cosine_similarity, EmbeddingProvider, MockEmbeddingProvider, NullEmbeddingProvider,
    OpenAiEmbeddingProvider, SharedEmbeddingProvider,
};
pub use fetcher::{EmbeddingFetcher, FetchMode};
pub use grouper::{group_by_pivot, SemanticGrouper};
pub use pipeline::{naive_chunk_table, naive_text_to_embeddings, PipelineInput, TextPipeline};
pub use segmenter::{naive_split, split_sentences, SentenceSplitter};
pub use tokenizer::Tokenizer;
pub use types::{Chunk, ChunkTable, PipelineError, Record, Segment, TableStats};
