//! Generative-model provider implementations

pub mod gemini;
pub mod traits;

pub use gemini::GeminiClient;
pub use traits::{
    GenerationRequest, GenerationResponse, GenerativeProvider, Part, ProviderError, ProviderResult,
};

use std::sync::Arc;

use crate::config::Config;

/// Create the configured provider from the environment, applying model name
/// and request timeout from config.
pub fn create_provider(config: &Config) -> ProviderResult<Arc<dyn GenerativeProvider>> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| ProviderError::Config("GEMINI_API_KEY not set".to_string()))?;
    let client = GeminiClient::with_timeout(api_key, config.pipeline.timeout_ms)?
        .with_model(&config.model.name);
    Ok(Arc::new(client))
}
