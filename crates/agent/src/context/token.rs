//! Token counting.
//!
//! [`TiktokenCounter`] uses the `cl100k_base` BPE, the same accounting the
//! OpenAI completion models apply to prompts. [`HeuristicCounter`] is a
//! dependency-free ~4 characters per token approximation, accurate within
//! ~10% on English text.

use contextchat_core::error::Error;

/// Counts tokens in a string. Must be deterministic and side-effect free.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens `text` encodes to.
    fn count(&self, text: &str) -> usize;

    /// Encoding name, for logs.
    fn name(&self) -> &str;
}

/// Exact BPE counts with the `cl100k_base` encoding.
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

impl TiktokenCounter {
    /// Load the `cl100k_base` ranks (bundled with the crate, no network).
    pub fn cl100k() -> Result<Self, Error> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn name(&self) -> &str {
        "cl100k_base"
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter").finish_non_exhaustive()
    }
}

/// Character-based estimate: 1 token ≈ 4 bytes, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }

    fn name(&self) -> &str {
        "chars/4"
    }
}
