//! Core traits and types for genba, the construction-site inquiry assistant.
//!
//! This crate defines the fundamental pieces shared across the workspace:
//! the error taxonomy, the LLM provider trait, locale handling and the
//! bilingual message catalog, token counting, the bounded conversation
//! history, and the explicit session object.

pub mod error;
pub mod history;
pub mod llm;
pub mod locale;
pub mod session;
pub mod tokens;

pub use error::{Error, Result};
pub use history::{ConversationMemory, Exchange, DEFAULT_TOKEN_CEILING};
pub use llm::{ChatMessage, GenerationConfig, GenerationResult, LlmProvider, Role};
pub use locale::Locale;
pub use session::Session;
pub use tokens::TokenCounter;
