//! Generative-text provider abstraction.
//!
//! Handlers depend on the `TextProvider` trait rather than a concrete client,
//! so the Gemini backend can be swapped for a stub in tests.

pub mod gemini;

use async_trait::async_trait;

use crate::config::{STORY_TEMPERATURE, STORY_TOP_P};

pub use gemini::GeminiProvider;

/// Error type for provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Failed to build provider HTTP client: {0}")]
    Client(String),

    #[error("Provider network error: {0}")]
    Network(String),

    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Prompt blocked by provider: {0}")]
    Blocked(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Sampling parameters passed with each generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationParams {
    /// Parameters used for user-story generation
    pub fn user_story() -> Self {
        Self {
            temperature: STORY_TEMPERATURE,
            top_p: STORY_TOP_P,
        }
    }
}

/// A backend that turns a prompt into generated text.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Generate text for `prompt`. Waits for the backend to answer or fail.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;
}
