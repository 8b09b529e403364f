//! A single conversation.

use parley_memory::{ConversationMemory, KnowledgeStore};
use std::sync::Arc;
use uuid::Uuid;

/// One user's conversation: its own memory plus a shared, read-only
/// knowledge store.
pub struct Session {
    pub id: String,
    pub memory: ConversationMemory,
    pub knowledge: Arc<KnowledgeStore>,
}

impl Session {
    pub fn new(knowledge: Arc<KnowledgeStore>, memory: ConversationMemory) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            memory,
            knowledge,
        }
    }

    /// Forget the conversation so far. The knowledge store is untouched.
    pub fn reset(&mut self) {
        self.memory.clear();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("turns", &self.memory.len())
            .field("facts", &self.knowledge.len())
            .finish()
    }
}
