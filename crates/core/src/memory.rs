//! Conversation memory value types.
//!
//! A [`MemoryTurn`] is one utterance in the session transcript. Turns are
//! created by the persona engine, never mutated, and evicted oldest-first
//! once the memory window is full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// A single remembered utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryTurn {
    /// Who spoke
    pub speaker: Speaker,

    /// What was said
    pub text: String,

    /// Monotonic sequence number within the session, starting at 0
    pub seq: u64,

    /// Wall-clock creation time (display only; ordering uses `seq`)
    pub created_at: DateTime<Utc>,
}

impl MemoryTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>, seq: u64) -> Self {
        Self {
            speaker,
            text: text.into(),
            seq,
            created_at: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.speaker == Speaker::User
    }
}
