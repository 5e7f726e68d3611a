//! Provider trait definitions for hosted generative-model APIs
//!
//! The extraction pipeline never depends on a concrete vendor: it builds a
//! [`GenerationRequest`] and hands it to anything implementing
//! [`GenerativeProvider`].

use async_trait::async_trait;
use serde_json::Value;

use crate::config::GenerationSettings;

/// One piece of multimodal request content, in order.
#[derive(Debug, Clone)]
pub enum Part {
    /// Raw PDF bytes, transported inline
    Pdf(Vec<u8>),
    /// Plain text (instructions or intermediate step output)
    Text(String),
}

/// Request for a structured-JSON generation from a provider
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub parts: Vec<Part>,
    pub system_instruction: Option<String>,
    /// JSON schema the response must conform to (opaque, template-supplied)
    pub response_schema: Option<Value>,
    pub settings: GenerationSettings,
}

impl GenerationRequest {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            parts,
            system_instruction: None,
            response_schema: None,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_instruction = Some(system.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Response from a generative provider
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: String,
    pub latency_ms: u64,
}

impl GenerationResponse {
    /// Parse the response text as a JSON payload. The providers request JSON
    /// response mode, so anything else is a parse error.
    pub fn json_payload(&self) -> ProviderResult<Value> {
        serde_json::from_str(self.content.trim())
            .map_err(|e| ProviderError::Parse(format!("response is not valid JSON: {}", e)))
    }
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Trait for hosted generative-model providers
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Send a generation request
    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GenerationResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new(vec![Part::Text("extract".into())])
            .with_system("be terse")
            .with_schema(json!({"type": "array"}));

        assert_eq!(request.system_instruction.as_deref(), Some("be terse"));
        assert_eq!(request.settings.top_k, 1);
        assert!(request.response_schema.is_some());
    }

    #[test]
    fn test_json_payload_parsing() {
        let response = GenerationResponse {
            content: "  {\"metrics\": []}\n".to_string(),
            model: "m".to_string(),
            input_tokens: 1,
            output_tokens: 1,
            finish_reason: "STOP".to_string(),
            latency_ms: 0,
        };
        assert_eq!(response.json_payload().unwrap(), json!({"metrics": []}));

        let bad = GenerationResponse {
            content: "no json here".to_string(),
            ..response
        };
        assert!(matches!(bad.json_payload(), Err(ProviderError::Parse(_))));
    }
}
