//! Knowledge retrieval and conversation memory for Parley.

pub mod conversation;
pub mod knowledge;
pub mod vector;

pub use conversation::{ConversationMemory, FactKey, DEFAULT_WINDOW_SIZE};
pub use knowledge::{KnowledgeStore, DEFAULT_K};
pub use vector::{cosine_similarity, normalize};
