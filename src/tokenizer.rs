//! Token counting backed by `tiktoken-rs`, with process-wide encoding reuse.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tiktoken_rs::{get_bpe_from_model, CoreBPE};

use crate::types::PipelineError;

/// BPE construction is expensive; resolved encodings are shared per model.
static ENCODINGS: Lazy<Mutex<HashMap<String, Arc<CoreBPE>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn cached_encoding(model: &str) -> Result<Arc<CoreBPE>, PipelineError> {
    let mut cache = ENCODINGS.lock().expect("encoding cache mutex poisoned");
    if let Some(bpe) = cache.get(model) {
        return Ok(Arc::clone(bpe));
    }
    let bpe = get_bpe_from_model(model).map_err(|_| PipelineError::UnsupportedModel {
        model: model.to_string(),
    })?;
    let bpe = Arc::new(bpe);
    cache.insert(model.to_string(), Arc::clone(&bpe));
    Ok(bpe)
}

/// Counts tokens for a specific model's encoding.
///
/// Only token counts are used by the pipeline; the ids themselves are never
/// inspected.
#[derive(Clone)]
pub struct Tokenizer {
    model: String,
    bpe: Arc<CoreBPE>,
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Tokenizer {
    /// Resolves the encoding for `model`.
    ///
    /// Unknown model identifiers fail with
    /// [`PipelineError::UnsupportedModel`].
    pub fn for_model(model: &str) -> Result<Self, PipelineError> {
        Ok(Self {
            model: model.to_string(),
            bpe: cached_encoding(model)?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of tokens in `text` under the ordinary (no special tokens)
    /// encoding.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Counts a sentence together with the separator it will be joined with,
    /// so accumulated chunk totals match the reconstituted text.
    pub fn count_with_separator(&self, sentence: &str, separator: &str) -> usize {
        self.count(&format!("{sentence}{separator}"))
    }
}
