//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::prompt::PromptBuilder;
use crate::provider::TextProvider;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Everything here is built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub prompts: Arc<PromptBuilder>,
    pub provider: Arc<dyn TextProvider>,
}

impl AppState {
    /// Creates a new application state from the configuration, prompt builder and provider.
    pub fn new(config: AppConfig, prompts: PromptBuilder, provider: Arc<dyn TextProvider>) -> Self {
        Self {
            config: Arc::new(config),
            prompts: Arc::new(prompts),
            provider,
        }
    }
}
