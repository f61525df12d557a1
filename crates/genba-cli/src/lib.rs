//! Terminal interface for the genba inquiry assistant

mod ui;

pub use ui::{display_banner, handle_input_with_history, print_help};

// Re-export core types
pub use genba_core::{Error, Result};
