//! The persona engine: how Parley answers a turn.
//!
//! Every utterance goes through the same cycle:
//!
//! 1. **Classify** it as a calculation or chat
//! 2. **Calculate** directly when the calculator can answer
//! 3. **Retrieve** the facts closest to the utterance
//! 4. **Compose** a prompt from the persona, memory and facts
//! 5. **Generate** with the language model, or answer offline
//! 6. **Remember** the exchange in the session memory

pub mod engine;
pub mod intent;
pub mod offline;
pub mod persona;
pub mod prompt;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::{PersonaEngine, Reply, ReplyRoute};
pub use intent::{classify, Intent};
pub use offline::{FallbackReason, OFFLINE_MARKER};
pub use persona::Persona;
pub use prompt::{compose, ComposedPrompt};
pub use session::Session;
