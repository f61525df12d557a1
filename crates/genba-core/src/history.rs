//! Bounded conversation history with a running token budget

use crate::llm::ChatMessage;
use crate::tokens::TokenCounter;
use crate::{Error, Result};

/// Default history token ceiling
pub const DEFAULT_TOKEN_CEILING: usize = 1000;

/// One user/assistant exchange.
///
/// The atomic unit of retention and eviction, so the two roles can never be
/// desynchronized by partial removal.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
    user_tokens: usize,
    assistant_tokens: usize,
}

impl Exchange {
    pub fn tokens(&self) -> usize {
        self.user_tokens + self.assistant_tokens
    }
}

/// Ordered conversation history bounded by a token ceiling.
///
/// Exchanges are evicted oldest-first from index 1 onward; the first recorded
/// exchange stays pinned. Per-exchange token counts are cached from the same
/// counter that maintains the running total, so the total never drifts from
/// what a from-scratch recount would produce.
pub struct ConversationMemory {
    exchanges: Vec<Exchange>,
    total_tokens: usize,
    ceiling: usize,
    counter: TokenCounter,
}

impl ConversationMemory {
    pub fn new(counter: TokenCounter, ceiling: usize) -> Self {
        Self {
            exchanges: Vec::new(),
            total_tokens: 0,
            ceiling,
            counter,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Admission check for an incoming message.
    ///
    /// Counts tokens with the configured counter and rejects anything over
    /// the ceiling before any state is touched.
    pub fn admit(&self, message: &str) -> Result<usize> {
        let tokens = self.counter.count(message);
        if tokens > self.ceiling {
            return Err(Error::InputTooLarge {
                tokens,
                limit: self.ceiling,
            });
        }
        Ok(tokens)
    }

    /// Record a completed exchange, then evict old exchanges until the
    /// running total is back under the ceiling.
    ///
    /// Index 0 is never evicted. If only the pinned exchange remains and the
    /// total still exceeds the ceiling, eviction stops: a single exchange
    /// larger than the ceiling is retained as-is.
    pub fn record_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        let user = user.into();
        let assistant = assistant.into();
        let exchange = Exchange {
            user_tokens: self.counter.count(&user),
            assistant_tokens: self.counter.count(&assistant),
            user,
            assistant,
        };
        self.total_tokens += exchange.tokens();
        self.exchanges.push(exchange);

        while self.total_tokens > self.ceiling && self.exchanges.len() > 1 {
            let removed = self.exchanges.remove(1);
            self.total_tokens -= removed.tokens();
        }
    }

    /// Retained history flattened into chat messages, oldest first
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.exchanges.len() * 2);
        for exchange in &self.exchanges {
            out.push(ChatMessage::user(exchange.user.clone()));
            out.push(ChatMessage::assistant(exchange.assistant.clone()));
        }
        out
    }

    /// Recompute the token total from retained content
    pub fn recount(&self) -> usize {
        self.exchanges
            .iter()
            .map(|e| self.counter.count(&e.user) + self.counter.count(&e.assistant))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(ceiling: usize) -> ConversationMemory {
        let counter = TokenCounter::for_model("gpt-4o-mini").unwrap();
        ConversationMemory::new(counter, ceiling)
    }

    #[test]
    fn admit_at_ceiling_ok_one_over_rejected() {
        let counter = TokenCounter::for_model("gpt-4o-mini").unwrap();
        let message = "How long will the road closure in front of block four last?";
        let tokens = counter.count(message);

        let exact = ConversationMemory::new(
            TokenCounter::for_model("gpt-4o-mini").unwrap(),
            tokens,
        );
        assert_eq!(exact.admit(message).unwrap(), tokens);

        let tight = ConversationMemory::new(counter, tokens - 1);
        match tight.admit(message) {
            Err(Error::InputTooLarge { tokens: t, limit }) => {
                assert_eq!(t, tokens);
                assert_eq!(limit, tokens - 1);
            }
            other => panic!("expected admission error, got {:?}", other),
        }
    }

    #[test]
    fn rejected_admission_leaves_state_unchanged() {
        let mut mem = memory(50);
        mem.record_turn("short question", "short answer");
        let before_total = mem.total_tokens();
        let before_len = mem.exchanges().len();

        let oversized = "word ".repeat(200);
        assert!(mem.admit(&oversized).is_err());

        assert_eq!(mem.total_tokens(), before_total);
        assert_eq!(mem.exchanges().len(), before_len);
    }

    #[test]
    fn running_total_never_drifts() {
        let mut mem = memory(60);
        let turns = [
            ("When does the work start?", "It starts next Monday morning."),
            ("How noisy will it be?", "Heavy machinery runs between nine and five."),
            ("Is the sidewalk open?", "Yes, a guarded walkway stays open."),
            ("Who do I call?", "The site office number is on the flyer."),
        ];
        for (user, assistant) in turns {
            mem.record_turn(user, assistant);
            assert_eq!(mem.total_tokens(), mem.recount());
        }
    }

    #[test]
    fn eviction_keeps_total_under_ceiling() {
        let mut mem = memory(40);
        for i in 0..6 {
            mem.record_turn(
                format!("question number {} about the schedule", i),
                format!("answer number {} with some details", i),
            );
        }
        assert!(mem.total_tokens() <= 40);
        assert!(!mem.is_empty());
    }

    #[test]
    fn first_exchange_stays_pinned() {
        let mut mem = memory(40);
        mem.record_turn("seed question", "seed answer");
        for i in 0..5 {
            mem.record_turn(
                format!("later question {} with extra words", i),
                format!("later answer {} with extra words", i),
            );
        }
        assert_eq!(mem.exchanges()[0].user, "seed question");
    }

    #[test]
    fn single_oversized_exchange_is_retained() {
        let mut mem = memory(5);
        mem.record_turn(
            "a question that is clearly longer than five tokens in total",
            "and an answer that certainly pushes the pair over the ceiling",
        );
        // Eviction cannot run below one exchange; the boundary case keeps it.
        assert_eq!(mem.exchanges().len(), 1);
        assert!(mem.total_tokens() > mem.ceiling());
    }

    #[test]
    fn messages_preserve_pairing_and_order() {
        let mut mem = memory(1000);
        mem.record_turn("first q", "first a");
        mem.record_turn("second q", "second a");
        let msgs = mem.messages();
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].content, "first q");
        assert_eq!(msgs[1].content, "first a");
        assert_eq!(msgs[3].content, "second a");
    }
}
