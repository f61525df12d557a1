//! Process-scoped session state

use uuid::Uuid;

use crate::history::ConversationMemory;
use crate::locale::Locale;

/// Explicit session object passed by reference into core operations.
///
/// Bundles the conversation history, the active locale, and the inquiry-mode
/// flag for one process-scoped conversation. Nothing here persists across
/// sessions.
pub struct Session {
    /// Hex session id included in log lines
    pub id: String,
    pub locale: Locale,
    /// When on, messages bypass retrieval and go straight to the forwarder
    pub inquiry_mode: bool,
    pub memory: ConversationMemory,
}

impl Session {
    pub fn new(locale: Locale, memory: ConversationMemory) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            locale,
            inquiry_mode: false,
            memory,
        }
    }
}
