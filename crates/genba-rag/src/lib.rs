//! Retrieval-augmented answering for the genba inquiry assistant
//!
//! Ingests a folder tree of site documents, chunks and embeds them into a
//! directory-persisted vector index, and answers resident questions through
//! a history-aware retrieval chain with post-generation no-match detection.

mod chunker;
mod index;
mod loader;
mod no_match;
mod normalize;
mod pipeline;

#[cfg(test)]
mod tests;

pub use chunker::{Chunk, TextChunker};
pub use index::{EmbeddedChunk, IndexState, IndexStore, ScoredChunk, SearchIndex};
pub use loader::{load_tree, Document, LoaderRegistry};
pub use no_match::NoMatchRules;
pub use normalize::adjust_string;
pub use pipeline::{AnswerChain, DEFAULT_TOP_K};

// Re-export core types for convenience
pub use genba_core::{Error, Result};
