//! OpenAI integration for the genba inquiry assistant
//!
//! This crate provides the OpenAI implementation of the `LlmProvider` trait:
//! chat completions for generation and the embeddings endpoint for retrieval.

mod client;
mod config;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;

// Re-export core types for convenience
pub use genba_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LlmProvider, Result, Role,
};
