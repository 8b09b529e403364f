//! Deterministic offline responder.
//!
//! Used whenever the language model is unavailable. The same utterance, fact
//! and remembered name always give the same text.

use parley_core::error::{EmbeddingError, ProviderError};
use parley_providers::hashing::fnv1a;
use regex_lite::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Appended to every offline answer.
pub const OFFLINE_MARKER: &str = "[Offline Mode]";

const FACT_TEMPLATES: &[&str] = &[
    "Arr, me compass points to this fact: {fact}",
    "By the powers! Did ye know? {fact}",
    "Savvy? {fact}",
    "The Black Pearl's logbook says: {fact}",
    "Interesting... remarkably like this: {fact}",
    "Aye, that reminds me of when {fact}",
];

const GENERIC_REPLIES: &[&str] = &[
    "Arr! I be Cap'n Jack Sparrow!",
    "Why is the rum always gone?",
    "Did no one come to save me just because they missed me?",
    "I'm Captain Jack Sparrow. Savvy?",
    "Take what you can, give nothing back!",
    "Me compass is pointing to... rum!",
];

static NAME_QUESTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:what['’]s|what\s+is|do\s+you\s+(?:know|remember))\s+my\s+name\b").ok()
});

/// Why a turn was answered offline.
#[derive(Debug, Clone)]
pub enum FallbackReason {
    /// No language model is configured
    NoModel,
    /// The language model chain failed or answered with nothing
    Provider(ProviderError),
    /// The query could not be embedded for retrieval
    Embedding(EmbeddingError),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoModel => write!(f, "no language model configured"),
            FallbackReason::Provider(e) => write!(f, "{e}"),
            FallbackReason::Embedding(e) => write!(f, "{e}"),
        }
    }
}

/// True when the utterance asks the agent to recall the user's name.
pub fn is_name_question(utterance: &str) -> bool {
    NAME_QUESTION
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(utterance))
}

fn pick<'a>(choices: &[&'a str], utterance: &str) -> &'a str {
    let key = utterance.trim().to_lowercase();
    let index = (fnv1a(key.as_bytes()) % choices.len() as u64) as usize;
    choices[index]
}

/// Build an offline answer.
///
/// `top_fact` is the best retrieved fact, if any; `known_name` is the user's
/// name as remembered by the conversation.
pub fn respond(utterance: &str, top_fact: Option<&str>, known_name: Option<&str>) -> String {
    let body = if is_name_question(utterance) {
        match known_name {
            Some(name) => format!("Ye be {name}, of course! Captain Jack never forgets a face, savvy?"),
            None => "Ye never told me yer name, mate. A pirate keeps his secrets too, I suppose.".to_string(),
        }
    } else {
        match top_fact {
            Some(fact) => pick(FACT_TEMPLATES, utterance).replace("{fact}", fact),
            None => pick(GENERIC_REPLIES, utterance).to_string(),
        }
    };
    format!("{body} {OFFLINE_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_output() {
        let a = respond("Where's the rum?", Some("The rum is gone."), None);
        let b = respond("Where's the rum?", Some("The rum is gone."), None);
        assert_eq!(a, b);
        assert_eq!(
            respond("  WHERE'S the rum?  ", None, None),
            respond("where's the rum?", None, None)
        );
    }

    #[test]
    fn weaves_in_fact_and_marker() {
        let reply = respond("Tell me about the Pearl", Some("The Black Pearl has black sails."), None);
        assert!(reply.contains("The Black Pearl has black sails."));
        assert!(reply.ends_with(OFFLINE_MARKER));
        assert!(!reply.contains("{fact}"));
    }

    #[test]
    fn generic_reply_without_fact() {
        let reply = respond("Ahoy", None, None);
        let body = reply.trim_end_matches(OFFLINE_MARKER).trim_end();
        assert!(GENERIC_REPLIES.contains(&body));
    }

    #[test]
    fn template_choice_follows_hash() {
        let expected = FACT_TEMPLATES[(fnv1a(b"hello") % FACT_TEMPLATES.len() as u64) as usize];
        assert_eq!(
            respond("Hello", Some("X"), None),
            format!("{} {OFFLINE_MARKER}", expected.replace("{fact}", "X"))
        );
    }

    #[test]
    fn name_questions() {
        assert!(is_name_question("What's my name?"));
        assert!(is_name_question("what is my name"));
        assert!(is_name_question("Do you remember my name?"));
        assert!(!is_name_question("My name is Elizabeth"));

        let reply = respond("What's my name?", Some("irrelevant"), Some("Elizabeth"));
        assert!(reply.contains("Elizabeth"));
        assert!(!reply.contains("irrelevant"));

        let reply = respond("What's my name?", None, None);
        assert!(reply.contains("never told me"));
        assert!(reply.ends_with(OFFLINE_MARKER));
    }

    #[test]
    fn reason_display() {
        assert_eq!(FallbackReason::NoModel.to_string(), "no language model configured");
        let reason = FallbackReason::Provider(ProviderError::Timeout("slow".into()));
        assert!(reason.to_string().contains("timed out"));
    }
}
