//! Gemini API client
//!
//! Binds to the `generativelanguage.googleapis.com` REST surface. PDF parts
//! travel as base64 inline data; responses are requested in JSON mode with
//! the template-supplied schema attached and all safety categories set to
//! block-none, mirroring how the extraction prompts were calibrated.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

use super::traits::{
    GenerationRequest, GenerationResponse, GenerativeProvider, Part, ProviderError, ProviderResult,
};

const DEFAULT_MODEL: &str = "gemini-1.5-pro-002";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_MS: u64 = 120_000;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];

/// Gemini REST API client
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http_client: Client,
    model: String,
    timeout_ms: u64,
}

impl GeminiClient {
    /// Create a new client with default model and timeout
    pub fn new(api_key: String) -> ProviderResult<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT_MS)
    }

    /// Create a client with an explicit per-request timeout
    pub fn with_timeout(api_key: String, timeout_ms: u64) -> ProviderResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(ProviderError::Http)?;
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client,
            model: DEFAULT_MODEL.to_string(),
            timeout_ms,
        })
    }

    /// Create from the `GEMINI_API_KEY` environment variable
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::Config("GEMINI_API_KEY not set".to_string()))?;
        Self::new(api_key)
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model requests are sent to
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Serialize)]
struct ContentPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl ContentPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn pdf(bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: "application/pdf".to_string(),
                data: BASE64.encode(bytes),
            }),
        }
    }
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "candidateCount")]
    candidate_count: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "modelVersion")]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

fn build_body(model_request: &GenerationRequest) -> GeminiRequest {
    let parts = model_request
        .parts
        .iter()
        .map(|part| match part {
            Part::Pdf(bytes) => ContentPart::pdf(bytes),
            Part::Text(text) => ContentPart::text(text),
        })
        .collect();

    let settings = &model_request.settings;
    GeminiRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: model_request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![ContentPart::text(text)],
        }),
        generation_config: GenerationConfig {
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            candidate_count: settings.candidate_count,
            max_output_tokens: settings.max_output_tokens,
            response_mime_type: "application/json".to_string(),
            response_schema: model_request.response_schema.clone(),
        },
        safety_settings: SAFETY_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: category.to_string(),
                threshold: "BLOCK_NONE".to_string(),
            })
            .collect(),
    }
}

#[async_trait]
impl GenerativeProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GenerationResponse> {
        let body = build_body(request);
        let start = Instant::now();

        let response = self
            .http_client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let error: GeminiErrorResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::Parse(e.to_string()))?;
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error.error.message,
            });
        }

        let api_response: GeminiResponse = response.json().await?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Parse("response has no candidates".to_string()))?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let finish_reason = candidate
            .finish_reason
            .unwrap_or_else(|| "unknown".to_string());
        tracing::debug!("Gemini finish reason: {}", finish_reason);

        let (input_tokens, output_tokens) = api_response
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));

        Ok(GenerationResponse {
            content,
            model: api_response.model_version.unwrap_or_else(|| self.model.clone()),
            input_tokens,
            output_tokens,
            finish_reason,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest::new(vec![
            Part::Pdf(vec![0x25, 0x50, 0x44, 0x46]),
            Part::Text("extract the metrics".to_string()),
        ])
        .with_system("you are an auditor")
        .with_schema(json!({"type": "object"}));

        let body = serde_json::to_value(build_body(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(
            body["contents"][0]["parts"][0]["inlineData"]["data"],
            BASE64.encode([0x25, 0x50, 0x44, 0x46])
        );
        assert_eq!(body["contents"][0]["parts"][1]["text"], "extract the metrics");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "you are an auditor");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
        assert_eq!(body["generationConfig"]["topK"], 1);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "object");
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }

    #[test]
    fn test_body_omits_absent_fields() {
        let request = GenerationRequest::new(vec![Part::Text("hi".to_string())]);
        let body = serde_json::to_value(build_body(&request)).unwrap();

        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("responseSchema").is_none());
        assert!(body["contents"][0]["parts"][0].get("inlineData").is_none());
    }
}
