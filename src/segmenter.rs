//! Sentence splitting: a linguistic boundary detector plus a deliberately
//! naive delimiter fallback.

/// Strategy for breaking raw text into sentence-like units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SentenceSplitter {
    /// Sentence boundaries per UAX #29 (or `segtok` when the
    /// `segtok-segmenter` feature is enabled). No additional policy; output
    /// order matches appearance in the text.
    #[default]
    Linguistic,
    /// Split on the literal `". "` and drop every fragment whose character
    /// length is at or below `minimal_length`. Short sentences are silently
    /// discarded; that is the intended behavior, not a bug.
    Naive { minimal_length: usize },
}

impl SentenceSplitter {
    pub fn split(&self, text: &str) -> Vec<String> {
        match self {
            SentenceSplitter::Linguistic => split_sentences(text),
            SentenceSplitter::Naive { minimal_length } => naive_split(text, *minimal_length),
        }
    }
}

/// Splits `text` into sentences using linguistic boundary detection.
///
/// Empty input yields an empty vector.
#[cfg(not(feature = "segtok-segmenter"))]
pub fn split_sentences(text: &str) -> Vec<String> {
    use unicode_segmentation::UnicodeSegmentation;

    text.unicode_sentences()
        .map(|sentence| sentence.trim().to_string())
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Splits `text` into sentences using the segtok segmenter.
#[cfg(feature = "segtok-segmenter")]
pub fn split_sentences(text: &str) -> Vec<String> {
    segtok::segmenter::split_single(text, segtok::segmenter::SegmentConfig::default())
        .into_iter()
        .map(|sentence| sentence.trim().to_string())
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Splits on the literal `". "` substring, retaining only fragments strictly
/// longer than `minimal_length` characters.
pub fn naive_split(text: &str, minimal_length: usize) -> Vec<String> {
    text.split(". ")
        .filter(|fragment| fragment.chars().count() > minimal_length)
        .map(str::to_string)
        .collect()
}
