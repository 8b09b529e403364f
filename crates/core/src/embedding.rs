//! Embedder trait — the abstraction over text embedding models.
//!
//! The knowledge store embeds every fact once at load time and every query
//! at retrieval time, always through the same embedder, so all vectors share
//! one dimension.

use async_trait::async_trait;
use crate::error::EmbeddingError;

/// A fixed-dimension embedding vector.
pub type Embedding = Vec<f32>;

/// Turns text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier of the backend and model (e.g. "hashing-384").
    ///
    /// Used to decide whether a cached index is still valid.
    fn name(&self) -> &str;

    /// Dimension of the produced vectors, when known ahead of time.
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Embed a batch of texts. Returns one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Embedding>, EmbeddingError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> std::result::Result<Embedding, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        match vectors.len() {
            1 => Ok(vectors.remove(0)),
            actual => Err(EmbeddingError::CountMismatch { expected: 1, actual }),
        }
    }
}
