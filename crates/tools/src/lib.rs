//! Deterministic tools available to the persona.
//!
//! Currently a single calculator: the persona engine asks [`calculator::try_parse`]
//! whether an utterance is an arithmetic request and, if so, answers with
//! [`calculator::invoke`] instead of the language model.

pub mod calculator;

pub use calculator::{evaluate, format_value, invoke, try_parse};
