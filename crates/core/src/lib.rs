//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley persona agent.
//! This crate has **no framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability (language model, embedding model) is a trait
//! here. Implementations live in `parley-providers`. This enables:
//! - Swapping backends via configuration
//! - Testing the orchestrator with scripted and failing mocks
//! - A clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod embedding;
pub mod knowledge;
pub mod memory;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{EmbeddingError, Error, KnowledgeError, ProviderError, Result, ToolError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use embedding::{Embedder, Embedding};
pub use knowledge::{Fact, ScoredFact};
pub use memory::{MemoryTurn, Speaker};
pub use tool::ToolResult;
