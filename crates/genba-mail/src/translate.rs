//! LLM-backed English-to-Japanese translation for forwarded inquiries

use std::sync::Arc;

use tracing::warn;

use genba_core::LlmProvider;
use genba_core::locale::messages;

/// Translates inquiry text into Japanese for the site staff
pub struct JapaneseTranslator<P: LlmProvider> {
    provider: Arc<P>,
}

impl<P: LlmProvider> JapaneseTranslator<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Translate `text` into Japanese.
    ///
    /// Failure never aborts the caller: the original text comes back tagged
    /// as untranslated instead.
    pub async fn translate(&self, text: &str) -> String {
        let prompt = messages::translation_prompt(text);
        match self.provider.generate(&prompt).await {
            Ok(result) => {
                let translated = result.text.trim();
                if translated.is_empty() {
                    warn!("translation returned empty text");
                    format!("[翻訳失敗] {}", text)
                } else {
                    translated.to_string()
                }
            }
            Err(e) => {
                warn!(error = %e, "translation failed");
                format!("[翻訳失敗] {}", text)
            }
        }
    }
}
