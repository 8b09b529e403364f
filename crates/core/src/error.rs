//! Error types for the Parley domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] ties them together.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Parley operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Language model errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Embedding errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Knowledge base errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the hosted language model.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the embedding capability.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding service error: {message} (status: {status_code})")]
    Service {
        status_code: u16,
        message: String,
    },

    #[error("Embedding authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Embedding network error: {0}")]
    Network(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding model unavailable: {0}")]
    Model(String),

    #[error("Embedder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Failures while building the knowledge base at startup.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Knowledge file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("Failed to read knowledge file {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("Knowledge file {} contains no facts", path.display())]
    Empty { path: PathBuf },

    #[error("Failed to embed knowledge base: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index cache {} is unusable: {reason}", path.display())]
    Cache { path: PathBuf, reason: String },
}

/// Failures of the calculator tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Could not parse expression: {0}")]
    Parse(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unsupported expression: {0}")]
    Unsupported(String),
}

impl ToolError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Parse(_) => "parse_error",
            ToolError::DivisionByZero => "division_by_zero",
            ToolError::Unsupported(_) => "unsupported",
        }
    }
}
