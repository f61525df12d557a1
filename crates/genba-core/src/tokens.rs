//! Token counting for history budgeting

use tiktoken_rs::CoreBPE;

use super::{Error, Result};

/// Token counter with a stable vocabulary mapping for the configured model.
///
/// Only the encoded length is ever used.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Encoder matching the configured model, falling back to the generic
    /// `cl100k_base` encoding when the model is unknown.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .or_else(|_| tiktoken_rs::cl100k_base())
            .map_err(|e| Error::Configuration(format!("tokenizer unavailable: {}", e)))?;
        Ok(Self { bpe })
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_positive_and_monotonic_in_length() {
        let counter = TokenCounter::for_model("gpt-4o-mini").unwrap();
        let short = counter.count("Hi");
        let long = counter.count("The construction work near the parking lot ends this month.");
        assert!(short > 0);
        assert!(long > short);
    }

    #[test]
    fn unknown_model_falls_back_to_generic_encoding() {
        let counter = TokenCounter::for_model("no-such-model-v99").unwrap();
        assert!(counter.count("fallback still counts") > 0);
    }
}
