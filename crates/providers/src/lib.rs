//! Language model and embedding backends for Parley.
//!
//! Language models implement `parley_core::Provider`, embedders implement
//! `parley_core::Embedder`. The router builds both from configuration.

pub mod fallback;
pub mod hashing;
#[cfg(feature = "local")]
pub mod local;
pub mod openai_compat;
pub mod router;

pub use fallback::FallbackProvider;
pub use hashing::HashingEmbedder;
#[cfg(feature = "local")]
pub use local::LocalEmbedder;
pub use openai_compat::{OpenAiCompatEmbedder, OpenAiCompatProvider};
pub use router::{build_embedder, build_language_model, default_base_url};
