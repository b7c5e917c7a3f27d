//! Generative model provider abstractions and implementations.
//!
//! The HTTP layer only sees [`TextProvider`], so the Vertex AI backend can be
//! swapped for the mock in tests.

pub mod mock;
pub mod vertex;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
///
/// Variants are kept apart for logs only. Callers over HTTP see one generic
/// failure shape.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response blocked: {0}")]
    Blocked(String),
}

/// Single-shot text generation: one prompt in, one completion out.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}
