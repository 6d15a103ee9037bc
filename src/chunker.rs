//! Greedy token-bounded packing of sentences into chunks.

use crate::config::OversizedSentencePolicy;
use crate::tokenizer::Tokenizer;
use crate::types::Chunk;

/// Options for [`pack_sentences`].
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkerOptions {
    /// Token budget per chunk.
    pub max_tokens: usize,
    /// Handling of sentences that alone exceed the budget.
    pub policy: OversizedSentencePolicy,
    /// Separator used both to join chunk text and when counting each
    /// sentence's tokens.
    pub separator: String,
}

impl Default for ChunkerOptions {
    fn default() -> Self {
        Self {
            max_tokens: 120,
            policy: OversizedSentencePolicy::default(),
            separator: " ".to_string(),
        }
    }
}

/// Packs ordered sentences into chunks without exceeding the token budget.
///
/// Greedy, single pass, no backtracking: a sentence joins the running chunk
/// while the accumulated total stays within budget; otherwise the running
/// chunk is emitted and a new one starts at the current sentence. Each
/// sentence is counted with the trailing separator included, matching how
/// the chunk text is reconstituted.
///
/// Guarantees: original sentence order is preserved, every emitted chunk's
/// token count is the sum of its members' counts as measured at append time,
/// and no empty chunk is ever emitted. Oversized single sentences follow
/// `options.policy`.
pub fn pack_sentences(
    sentences: &[String],
    tokenizer: &Tokenizer,
    options: &ChunkerOptions,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0usize;

    for sentence in sentences {
        let n_tokens = tokenizer.count_with_separator(sentence, &options.separator);

        if !current.is_empty() && current_tokens + n_tokens > options.max_tokens {
            chunks.push(Chunk::new(current.join(&options.separator), current_tokens));
            current.clear();
            current_tokens = 0;
        }

        // A skipped oversized sentence still closes the running chunk above;
        // its neighbors must not merge across it.
        if n_tokens > options.max_tokens && options.policy == OversizedSentencePolicy::Skip {
            continue;
        }

        current.push(sentence);
        current_tokens += n_tokens;
    }

    if !current.is_empty() {
        chunks.push(Chunk::new(current.join(&options.separator), current_tokens));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::for_model("gpt-3.5-turbo").unwrap()
    }

    fn sentences(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn small_sentences_fit_in_one_chunk() {
        let tokenizer = tokenizer();
        let input = sentences(&["A", "B", "C"]);
        let chunks = pack_sentences(&input, &tokenizer, &ChunkerOptions::default());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A B C");
        let expected: usize = input
            .iter()
            .map(|s| tokenizer.count_with_separator(s, " "))
            .sum();
        assert_eq!(chunks[0].token_count, expected);
    }

    #[test]
    fn budget_overflow_starts_a_new_chunk() {
        let tokenizer = tokenizer();
        let input = sentences(&[
            "the quick brown fox jumps over the lazy dog",
            "pack my box with five dozen liquor jugs",
            "sphinx of black quartz judge my vow",
        ]);
        let per_sentence: Vec<usize> = input
            .iter()
            .map(|s| tokenizer.count_with_separator(s, " "))
            .collect();
        // Budget fits exactly one sentence at a time.
        let options = ChunkerOptions {
            max_tokens: *per_sentence.iter().max().unwrap(),
            ..Default::default()
        };

        let chunks = pack_sentences(&input, &tokenizer, &options);
        assert_eq!(chunks.len(), 3);
        for (chunk, (sentence, tokens)) in chunks.iter().zip(input.iter().zip(&per_sentence)) {
            assert_eq!(&chunk.text, sentence);
            assert_eq!(chunk.token_count, *tokens);
        }
    }

    #[test]
    fn token_counts_sum_over_members() {
        let tokenizer = tokenizer();
        let input = sentences(&[
            "alpha beta gamma delta",
            "epsilon zeta",
            "eta theta iota kappa lambda",
            "mu",
        ]);
        let options = ChunkerOptions {
            max_tokens: 8,
            ..Default::default()
        };
        let chunks = pack_sentences(&input, &tokenizer, &options);

        let chunk_total: usize = chunks.iter().map(|c| c.token_count).sum();
        let sentence_total: usize = input
            .iter()
            .map(|s| tokenizer.count_with_separator(s, " "))
            .sum();
        assert_eq!(chunk_total, sentence_total);
    }

    #[test]
    fn concatenated_chunks_preserve_sentence_order() {
        let tokenizer = tokenizer();
        let input = sentences(&["one", "two", "three", "four", "five", "six"]);
        let options = ChunkerOptions {
            max_tokens: 3,
            ..Default::default()
        };
        let chunks = pack_sentences(&input, &tokenizer, &options);

        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, input.join(" "));
    }

    #[test]
    fn skip_policy_drops_oversized_sentences_entirely() {
        let tokenizer = tokenizer();
        let oversized =
            "this sentence rambles on long enough that it cannot possibly fit the tiny budget";
        let input = sentences(&["ok", oversized, "fine"]);
        let options = ChunkerOptions {
            max_tokens: 4,
            policy: OversizedSentencePolicy::Skip,
            ..Default::default()
        };
        let chunks = pack_sentences(&input, &tokenizer, &options);

        assert!(chunks.iter().all(|c| !c.text.contains("rambles")));
        // The dropped sentence still closes the running chunk, so its
        // neighbors end up in separate chunks.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "ok");
        assert_eq!(chunks[1].text, "fine");
    }

    #[test]
    fn keep_policy_emits_oversized_sentence_alone() {
        let tokenizer = tokenizer();
        let oversized =
            "this sentence rambles on long enough that it cannot possibly fit the tiny budget";
        let input = sentences(&["ok", oversized, "fine"]);
        let options = ChunkerOptions {
            max_tokens: 4,
            policy: OversizedSentencePolicy::KeepOversized,
            ..Default::default()
        };
        let chunks = pack_sentences(&input, &tokenizer, &options);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, oversized);
        assert!(chunks[1].token_count > options.max_tokens);
        assert!(chunks[0].token_count <= options.max_tokens);
        assert!(chunks[2].token_count <= options.max_tokens);
    }

    #[test]
    fn empty_input_emits_no_chunks() {
        let chunks = pack_sentences(&[], &tokenizer(), &ChunkerOptions::default());
        assert!(chunks.is_empty());
    }
}
