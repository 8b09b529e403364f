//! Sliding-window conversation memory.
//!
//! Holds the last `window_size` turns (a user utterance and an agent reply
//! are two turns) and renders them as a plain transcript for the prompt.

use parley_core::memory::{MemoryTurn, Speaker};
use regex_lite::Regex;
use std::collections::VecDeque;
use std::sync::LazyLock;
use tracing::trace;

/// Default number of turns kept.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Label for user turns in the rendered transcript.
const USER_LABEL: &str = "User";

/// Facts that can be pulled out of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKey {
    /// The user's name, as introduced by "my name is X" and friends
    Name,
}

static NAME_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i:\bmy\s+name\s+is|\bcall\s+me|\bi['’]m|\bi\s+am)\s+([A-Z][A-Za-z'’-]*)").ok()
});

/// Bounded, append-only log of conversation turns.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<MemoryTurn>,
    window_size: usize,
    next_seq: u64,
    agent_label: String,
}

impl ConversationMemory {
    /// Create an empty memory. A `window_size` of 0 is treated as 1.
    pub fn new(window_size: usize, agent_label: impl Into<String>) -> Self {
        let window_size = window_size.max(1);
        Self {
            turns: VecDeque::with_capacity(window_size + 1),
            window_size,
            next_seq: 0,
            agent_label: agent_label.into(),
        }
    }

    /// Append a turn, evicting the oldest turns beyond the window.
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) {
        let turn = MemoryTurn::new(speaker, text, self.next_seq);
        self.next_seq += 1;
        self.turns.push_back(turn);

        while self.turns.len() > self.window_size {
            if let Some(evicted) = self.turns.pop_front() {
                trace!(seq = evicted.seq, "Evicted memory turn");
            }
        }
    }

    /// Render the turns oldest-first, one `Label: text` line each.
    ///
    /// An empty memory renders as the empty string.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| {
                let label = match turn.speaker {
                    Speaker::User => USER_LABEL,
                    Speaker::Agent => self.agent_label.as_str(),
                };
                format!("{label}: {}", turn.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Look up a fact the user has stated, newest statement first.
    pub fn extract_fact(&self, key: FactKey) -> Option<String> {
        match key {
            FactKey::Name => {
                let pattern = NAME_PATTERN.as_ref()?;
                self.turns
                    .iter()
                    .rev()
                    .filter(|turn| turn.is_user())
                    .find_map(|turn| {
                        pattern
                            .captures_iter(&turn.text)
                            .last()
                            .and_then(|caps| caps.get(1))
                            .map(|m| m.as_str().trim_end_matches(['\'', '’', '-']).to_string())
                    })
            }
        }
    }

    /// Drop every turn. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Current turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &MemoryTurn> {
        self.turns.iter()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE, "Agent")
    }
}
