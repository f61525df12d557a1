//! Inquiry forwarding for the genba inquiry assistant
//!
//! The parallel path beside the RAG flow: when inquiry mode is on, resident
//! messages are translated where needed and forwarded to the site staff over
//! authenticated SMTP.

mod forwarder;
mod translate;

pub use forwarder::{InquiryForwarder, MailConfig};
pub use translate::JapaneseTranslator;

// Re-export core types for convenience
pub use genba_core::{Error, Result};
