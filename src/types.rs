//! Core value types and the crate-wide error enum.
//!
//! Every pipeline stage produces a new owned collection of these values;
//! nothing here is mutated in place after creation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors surfaced by chunking, tokenization, and embedding retrieval.
///
/// All failures propagate directly to the caller; nothing is swallowed or
/// logged-and-dropped inside the library.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Tokenization was requested for a model the tokenizer does not know.
    #[error("tokenizer does not support model '{model}'")]
    UnsupportedModel { model: String },

    /// The embedding provider returned a failure or an unusable payload.
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// Transport-level failure talking to the embedding service.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A spawned fetch task panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    TaskJoin(String),
}

/// An ordered, non-empty run of consecutive sentences joined into one text
/// block, annotated with the total token count measured at append time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub token_count: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, token_count: usize) -> Self {
        Self {
            text: text.into(),
            token_count,
        }
    }
}

/// One or more consecutive chunks merged because every member stayed
/// semantically similar to the segment's starting chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub token_count: usize,
    pub chunk_count: usize,
}

impl Segment {
    /// Builds a segment from a non-empty run of chunks, joining their texts
    /// with a single space and summing their token counts.
    pub fn from_chunks(chunks: &[&Chunk]) -> Self {
        let text = chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let token_count = chunks.iter().map(|chunk| chunk.token_count).sum();
        Self {
            text,
            token_count,
            chunk_count: chunks.len(),
        }
    }
}

/// Final pipeline row: text plus token count, with the embedding vector
/// absent until the fetch stage populates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub text: String,
    pub token_count: usize,
    pub embedding: Option<Vec<f32>>,
}

impl Record {
    pub fn new(text: impl Into<String>, token_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            token_count,
            embedding: None,
        }
    }

    /// Attach an embedding vector, consuming the record.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Tabular pipeline output: columns `text`, `token_count`, and (after the
/// fetch stage) `embedding`. Row order always matches input order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkTable {
    records: Vec<Record>,
}

impl ChunkTable {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Builds a table from `(text, token_count)` pairs, preserving order.
    pub fn from_rows(rows: impl IntoIterator<Item = (String, usize)>) -> Self {
        Self {
            records: rows
                .into_iter()
                .map(|(text, token_count)| Record::new(text, token_count))
                .collect(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` once every row carries an embedding vector.
    pub fn is_embedded(&self) -> bool {
        self.records.iter().all(|record| record.embedding.is_some())
    }

    pub fn stats(&self) -> TableStats {
        let total_tokens: usize = self.records.iter().map(|record| record.token_count).sum();
        let average_tokens = if self.records.is_empty() {
            0.0
        } else {
            total_tokens as f64 / self.records.len() as f64
        };
        TableStats {
            rows: self.records.len(),
            total_tokens,
            average_tokens,
        }
    }
}

impl From<Vec<Chunk>> for ChunkTable {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self::from_rows(
            chunks
                .into_iter()
                .map(|chunk| (chunk.text, chunk.token_count)),
        )
    }
}

impl From<Vec<Segment>> for ChunkTable {
    fn from(segments: Vec<Segment>) -> Self {
        Self::from_rows(
            segments
                .into_iter()
                .map(|segment| (segment.text, segment.token_count)),
        )
    }
}

/// Summary statistics over a [`ChunkTable`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    pub rows: usize,
    pub total_tokens: usize,
    pub average_tokens: f64,
}
