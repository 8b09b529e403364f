//! Intent classification.

use parley_tools::calculator;

/// What the user wants from this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// An arithmetic request; holds the extracted expression
    Calculation(String),
    /// Anything else; holds the utterance
    Chat(String),
}

/// Classify an utterance. Pure: no I/O, no state.
pub fn classify(utterance: &str) -> Intent {
    match calculator::try_parse(utterance) {
        Some(expression) => Intent::Calculation(expression),
        None => Intent::Chat(utterance.to_string()),
    }
}
