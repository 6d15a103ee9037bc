//! Pivot-based semantic grouping of adjacent chunks into segments.

use std::sync::Arc;

use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::types::{Chunk, PipelineError, Segment};

/// Merges maximal consecutive runs of similar chunks into segments.
///
/// `similarity(pivot, candidate)` scores the chunk at index `pivot` against
/// the chunk at index `candidate`. Comparisons are always made against the
/// chunk that *started* the current segment, not the immediately preceding
/// chunk: a segment grows only while every subsequent chunk stays similar to
/// its original starting chunk. That pivot policy is deliberate and must not
/// be swapped for a sliding comparison.
///
/// Every input chunk lands in exactly one output segment and segment order
/// matches chunk order. Zero or one input chunk yields zero or one segment
/// with no comparisons performed.
pub fn group_by_pivot(
    chunks: &[Chunk],
    threshold: f32,
    mut similarity: impl FnMut(usize, usize) -> f32,
) -> Vec<Segment> {
    let Some(first) = chunks.first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut pivot = 0usize;
    let mut members: Vec<&Chunk> = vec![first];

    for candidate in 1..chunks.len() {
        if similarity(pivot, candidate) >= threshold {
            members.push(&chunks[candidate]);
        } else {
            segments.push(Segment::from_chunks(&members));
            pivot = candidate;
            members = vec![&chunks[candidate]];
        }
    }

    segments.push(Segment::from_chunks(&members));
    segments
}

/// Groups chunks by embedding their texts and comparing cosine similarity
/// against the configured threshold.
pub struct SemanticGrouper {
    provider: Arc<dyn EmbeddingProvider>,
    threshold: f32,
}

impl SemanticGrouper {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, threshold: f32) -> Self {
        Self {
            provider,
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Embeds every chunk text once, then merges by pivot similarity.
    pub async fn group(&self, chunks: &[Chunk]) -> Result<Vec<Segment>, PipelineError> {
        if chunks.len() < 2 {
            return Ok(group_by_pivot(chunks, self.threshold, |_, _| 0.0));
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.provider.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(PipelineError::Embedding(format!(
                "provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        tracing::debug!(
            chunks = chunks.len(),
            threshold = self.threshold,
            "grouping chunks by pivot similarity"
        );

        Ok(group_by_pivot(chunks, self.threshold, |pivot, candidate| {
            cosine_similarity(&vectors[pivot], &vectors[candidate])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingProvider;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .map(|text| Chunk::new(text.to_string(), 1))
            .collect()
    }

    #[test]
    fn empty_and_single_inputs_need_no_comparisons() {
        let none = group_by_pivot(&[], 0.5, |_, _| panic!("no comparison expected"));
        assert!(none.is_empty());

        let one = group_by_pivot(&chunks(&["solo"]), 0.5, |_, _| {
            panic!("no comparison expected")
        });
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].text, "solo");
        assert_eq!(one[0].chunk_count, 1);
    }

    #[test]
    fn unreachable_threshold_keeps_every_chunk_separate() {
        let input = chunks(&["a", "b", "c"]);
        let segments = group_by_pivot(&input, 1.1, |_, _| 1.0);
        assert_eq!(segments.len(), 3);
        for (segment, chunk) in segments.iter().zip(&input) {
            assert_eq!(segment.text, chunk.text);
        }
    }

    #[test]
    fn always_satisfied_threshold_merges_everything() {
        let input = chunks(&["a", "b", "c"]);
        let segments = group_by_pivot(&input, -1.0, |_, _| 0.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "a b c");
        assert_eq!(segments[0].chunk_count, 3);
    }

    #[test]
    fn comparisons_use_the_segment_pivot_not_the_previous_chunk() {
        // sim(0,1) and sim(1,2) are high, but sim(0,2) is low. A sliding
        // comparison would merge all three; the pivot policy must not.
        let input = chunks(&["a", "b", "c"]);
        let segments = group_by_pivot(&input, 0.5, |pivot, candidate| {
            match (pivot, candidate) {
                (0, 1) => 0.9,
                (0, 2) => 0.1,
                (1, 2) => 0.9,
                other => panic!("unexpected comparison {other:?}"),
            }
        });
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "a b");
        assert_eq!(segments[1].text, "c");
    }

    #[test]
    fn every_chunk_appears_in_exactly_one_segment() {
        let input = chunks(&["a", "b", "c", "d", "e"]);
        let segments = group_by_pivot(&input, 0.5, |pivot, candidate| {
            // Break after every second chunk.
            if candidate - pivot < 2 {
                0.9
            } else {
                0.0
            }
        });
        let total: usize = segments.iter().map(|segment| segment.chunk_count).sum();
        assert_eq!(total, input.len());

        let rejoined = segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, "a b c d e");
    }

    #[tokio::test]
    async fn identical_texts_merge_under_embedding_similarity() {
        let provider = Arc::new(MockEmbeddingProvider::new());
        let grouper = SemanticGrouper::new(provider, 0.99);
        let input = chunks(&["same text", "same text"]);
        let segments = grouper.group(&input).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].chunk_count, 2);
    }

    #[tokio::test]
    async fn trailing_dissimilar_chunk_forms_its_own_segment() {
        let provider = Arc::new(MockEmbeddingProvider::new());
        let grouper = SemanticGrouper::new(provider, 1.01);
        let input = chunks(&["alpha", "omega"]);
        let segments = grouper.group(&input).await.unwrap();
        assert_eq!(segments.len(), 2);
    }
}
