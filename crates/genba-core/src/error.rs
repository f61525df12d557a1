//! Error types for the inquiry assistant

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error taxonomy for the genba system
#[derive(Error, Debug)]
pub enum Error {
    /// Incoming message larger than the history token ceiling. Reported to
    /// the caller without touching session state; not a system failure.
    #[error("input of {tokens} tokens exceeds the acceptance limit ({limit})")]
    InputTooLarge { tokens: usize, limit: usize },

    #[error("generation error: {0}")]
    Generation(String),

    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error("ingestion error: {0}")]
    Ingestion(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
