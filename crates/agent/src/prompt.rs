//! Prompt composition.
//!
//! The system instruction goes out as the system message. Retrieved facts,
//! the rendered memory and the new utterance form the user message, each
//! block only present when it has content.

use crate::persona::Persona;
use parley_core::knowledge::ScoredFact;
use parley_core::message::Message;

/// A prompt ready to send to the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

impl ComposedPrompt {
    /// System message followed by the user message.
    pub fn to_messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }

    /// The whole prompt as one string.
    pub fn full_text(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Build the prompt for one chat turn.
///
/// `memory` is the rendered transcript and does not yet contain `utterance`.
pub fn compose(
    persona: &Persona,
    memory: &str,
    facts: &[ScoredFact],
    utterance: &str,
) -> ComposedPrompt {
    let mut blocks = Vec::with_capacity(3);

    if !facts.is_empty() {
        let mut block = String::from("Relevant facts from your memory:");
        for (i, fact) in facts.iter().enumerate() {
            block.push_str(&format!("\n{}. {}", i + 1, fact.text()));
        }
        blocks.push(block);
    }

    if !memory.is_empty() {
        blocks.push(format!("Recent conversation:\n{memory}"));
    }

    blocks.push(format!("Current user message: {utterance}"));

    ComposedPrompt {
        system: persona.system_instruction(),
        user: blocks.join("\n\n"),
    }
}
