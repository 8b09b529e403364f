//! Knowledge base value types.

use serde::{Deserialize, Serialize};

/// A single immutable fact loaded from the knowledge file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Position of the fact among the kept (non-blank) lines, starting at 0
    pub id: usize,

    /// The fact text, trimmed
    pub text: String,

    /// Embedding as returned by the embedder (not normalized)
    pub embedding: Vec<f32>,
}

/// A fact paired with its cosine similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFact {
    pub fact: Fact,
    pub score: f32,
}

impl ScoredFact {
    /// The fact text.
    pub fn text(&self) -> &str {
        &self.fact.text
    }
}
