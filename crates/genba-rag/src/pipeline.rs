//! History-aware retrieval and grounded answer generation

use std::sync::Arc;

use tracing::{error, info};

use genba_core::locale::{messages, Locale};
use genba_core::{ChatMessage, GenerationConfig, LlmProvider, Result};

use crate::index::{ScoredChunk, SearchIndex};
use crate::no_match::NoMatchRules;

/// Retrieved chunks stuffed into the generation context per query
pub const DEFAULT_TOP_K: usize = 8;

/// Retrieval-augmented answer chain for one locale.
///
/// The locale's prompts are baked in at construction; switching locale means
/// discarding the chain and building a new one over a freshly loaded index.
pub struct AnswerChain<P: LlmProvider> {
    provider: Arc<P>,
    index: SearchIndex,
    locale: Locale,
    no_match: NoMatchRules,
    top_k: usize,
    config: GenerationConfig,
}

impl<P: LlmProvider> AnswerChain<P> {
    pub fn new(provider: Arc<P>, index: SearchIndex, locale: Locale) -> Self {
        let config = GenerationConfig {
            model_id: provider.model_id().to_string(),
            ..Default::default()
        };
        Self {
            provider,
            index,
            locale,
            no_match: NoMatchRules::default(),
            top_k: DEFAULT_TOP_K,
            config,
        }
    }

    pub fn with_no_match_rules(mut self, rules: NoMatchRules) -> Self {
        self.no_match = rules;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Answer one user message against the index, aware of prior history.
    ///
    /// Rewrite → embed → top-K search → grounded generation → no-match
    /// substitution. Model failures are logged and propagated unchanged; the
    /// answer language follows the chain's locale, not the input language.
    pub async fn answer(&self, input: &str, history: &[ChatMessage]) -> Result<String> {
        let standalone = self.rewrite_query(input, history).await?;

        let query_vector = self.provider.embed(&standalone).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;
        let hits = self.index.search(&query_vector, self.top_k);
        info!(query = %standalone, hits = hits.len(), "retrieved context chunks");

        let system =
            messages::answer_instruction(self.locale).replace("{context}", &build_context(&hits));

        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(ChatMessage::system(system));
        prompt.extend_from_slice(history);
        prompt.push(ChatMessage::user(input));

        let result = self.provider.chat(&prompt, &self.config).await.map_err(|e| {
            error!(error = %e, "answer generation failed");
            e
        })?;

        Ok(self.no_match.apply(self.locale, result.text))
    }

    /// Rewrite the latest input into a query that stands alone without the
    /// conversation history. With no history the input already does.
    async fn rewrite_query(&self, input: &str, history: &[ChatMessage]) -> Result<String> {
        if history.is_empty() {
            return Ok(input.to_string());
        }

        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(ChatMessage::system(messages::rewrite_instruction(self.locale)));
        prompt.extend_from_slice(history);
        prompt.push(ChatMessage::user(input));

        let result = self.provider.chat(&prompt, &self.config).await.map_err(|e| {
            error!(error = %e, "query rewrite failed");
            e
        })?;

        let text = result.text.trim();
        if text.is_empty() {
            Ok(input.to_string())
        } else {
            Ok(text.to_string())
        }
    }
}

/// Join retrieved chunk texts into the `{context}` block
fn build_context(hits: &[ScoredChunk]) -> String {
    let mut context = String::new();
    for (i, hit) in hits.iter().enumerate() {
        if i > 0 {
            context.push_str("\n\n");
        }
        context.push_str(&hit.chunk.content);
    }
    context
}
