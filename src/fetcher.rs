//! Attaches embedding vectors to table rows, sequentially or fanned out.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::embeddings::SharedEmbeddingProvider;
use crate::types::{ChunkTable, PipelineError};

/// Execution mode for the embedding-fetch stage. Both modes produce the
/// same ordered output; they differ only in how requests overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// One request at a time, each response recorded before the next call.
    Sequential,
    /// All requests in flight at once (scatter/gather); results are
    /// reassembled in original row order regardless of arrival order.
    #[default]
    Concurrent,
}

/// Fetches one embedding per table row from the configured provider.
///
/// A hard failure on any single request aborts the whole fetch; there is no
/// partial-results return.
pub struct EmbeddingFetcher {
    provider: SharedEmbeddingProvider,
    mode: FetchMode,
    concurrency_limit: Option<usize>,
}

impl EmbeddingFetcher {
    pub fn new(provider: SharedEmbeddingProvider) -> Self {
        Self {
            provider,
            mode: FetchMode::default(),
            concurrency_limit: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Caps the number of concurrent in-flight requests. Unbounded by
    /// default, so very large tables fan out one request per row.
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit.max(1));
        self
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Populates the `embedding` column of every row, preserving row order.
    pub async fn attach(&self, table: ChunkTable) -> Result<ChunkTable, PipelineError> {
        tracing::debug!(
            rows = table.len(),
            mode = ?self.mode,
            provider = self.provider.name(),
            "fetching embeddings"
        );
        match self.mode {
            FetchMode::Sequential => self.attach_sequential(table).await,
            FetchMode::Concurrent => self.attach_concurrent(table).await,
        }
    }

    async fn attach_sequential(&self, table: ChunkTable) -> Result<ChunkTable, PipelineError> {
        let mut embedded = Vec::with_capacity(table.len());
        for record in table.into_records() {
            let vector = self.provider.embed(&record.text).await?;
            embedded.push(record.with_embedding(vector));
        }
        Ok(ChunkTable::new(embedded))
    }

    async fn attach_concurrent(&self, table: ChunkTable) -> Result<ChunkTable, PipelineError> {
        let records = table.into_records();
        let semaphore = self
            .concurrency_limit
            .map(|limit| Arc::new(Semaphore::new(limit)));

        let mut tasks: JoinSet<(usize, Result<Vec<f32>, PipelineError>)> = JoinSet::new();
        for (index, record) in records.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let text = record.text.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(err) => return (index, Err(PipelineError::TaskJoin(err.to_string()))),
                    },
                    None => None,
                };
                (index, provider.embed(&text).await)
            });
        }

        // Each task writes only its own slot; arrival order is irrelevant.
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; records.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) =
                joined.map_err(|err| PipelineError::TaskJoin(err.to_string()))?;
            slots[index] = Some(result?);
        }

        let mut embedded = Vec::with_capacity(records.len());
        for (record, slot) in records.into_iter().zip(slots) {
            let vector = slot
                .ok_or_else(|| PipelineError::TaskJoin("missing fetch result".to_string()))?;
            embedded.push(record.with_embedding(vector));
        }
        Ok(ChunkTable::new(embedded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{MockEmbeddingProvider, NullEmbeddingProvider};

    fn table(texts: &[&str]) -> ChunkTable {
        ChunkTable::from_rows(texts.iter().map(|text| (text.to_string(), 1)))
    }

    #[tokio::test]
    async fn sequential_attach_preserves_order() {
        let fetcher = EmbeddingFetcher::new(Arc::new(MockEmbeddingProvider::new()))
            .with_mode(FetchMode::Sequential);
        let embedded = fetcher.attach(table(&["a", "b", "c"])).await.unwrap();

        let texts: Vec<&str> = embedded
            .records()
            .iter()
            .map(|record| record.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(embedded.is_embedded());
    }

    #[tokio::test]
    async fn concurrent_attach_reassembles_in_input_order() {
        let fetcher = EmbeddingFetcher::new(Arc::new(MockEmbeddingProvider::new()));
        let rows: Vec<String> = (0..32).map(|i| format!("row {i}")).collect();
        let input = ChunkTable::from_rows(rows.iter().map(|text| (text.clone(), 1)));

        let embedded = fetcher.attach(input).await.unwrap();
        let texts: Vec<&str> = embedded
            .records()
            .iter()
            .map(|record| record.text.as_str())
            .collect();
        assert_eq!(texts, rows);
        assert!(embedded.is_embedded());
    }

    #[tokio::test]
    async fn bounded_concurrency_produces_identical_output() {
        let provider = Arc::new(MockEmbeddingProvider::new());
        let unbounded = EmbeddingFetcher::new(provider.clone());
        let bounded = EmbeddingFetcher::new(provider).with_concurrency_limit(2);

        let input = table(&["x", "y", "z"]);
        let a = unbounded.attach(input.clone()).await.unwrap();
        let b = bounded.attach(input).await.unwrap();

        for (left, right) in a.records().iter().zip(b.records()) {
            assert_eq!(left.text, right.text);
            assert_eq!(left.embedding, right.embedding);
        }
    }

    #[tokio::test]
    async fn any_failure_aborts_the_whole_fetch() {
        for mode in [FetchMode::Sequential, FetchMode::Concurrent] {
            let fetcher =
                EmbeddingFetcher::new(Arc::new(NullEmbeddingProvider::new())).with_mode(mode);
            let err = fetcher.attach(table(&["a", "b"])).await.unwrap_err();
            assert!(matches!(err, PipelineError::Embedding(_)));
        }
    }

    #[tokio::test]
    async fn empty_table_is_a_no_op() {
        let fetcher = EmbeddingFetcher::new(Arc::new(MockEmbeddingProvider::new()));
        let embedded = fetcher.attach(ChunkTable::default()).await.unwrap();
        assert!(embedded.is_empty());
    }
}
