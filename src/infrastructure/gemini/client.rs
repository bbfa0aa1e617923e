//! Gemini HTTP client implementing the text generator port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, StatusCode};
use tracing::{debug, instrument, warn};

use super::types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use crate::domain::errors::ProviderError;
use crate::domain::models::AiConfig;
use crate::domain::ports::TextGenerator;

/// Values shipped in sample configs that must never reach the API.
const PLACEHOLDER_KEYS: &[&str] = &[
    "your-api-key",
    "your_api_key",
    "your-gemini-api-key",
    "changeme",
    "placeholder",
    "xxx",
];

#[derive(Clone)]
pub struct GeminiClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub generation: GenerationConfig,
}

impl GeminiClientConfig {
    pub fn from_ai_config(ai: &AiConfig) -> Result<Self, ProviderError> {
        let api_key = ai
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::Configuration("Gemini API key is not configured".to_string()))?;

        Ok(Self {
            api_key,
            base_url: ai.base_url.trim_end_matches('/').to_string(),
            model: ai.model.clone(),
            timeout: Duration::from_millis(ai.request_timeout_ms),
            generation: GenerationConfig::default(),
        })
    }
}

impl std::fmt::Debug for GeminiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClientConfig")
            .field("api_key", &scrub_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// First four characters of a key followed by a mask.
pub fn scrub_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}***")
}

pub fn is_placeholder_key(key: &str) -> bool {
    let normalized = key.trim().to_lowercase();
    normalized.is_empty()
        || normalized.starts_with('<')
        || normalized.starts_with("your")
        || PLACEHOLDER_KEYS.iter().any(|p| normalized == *p)
}

pub struct GeminiClient {
    http_client: ReqwestClient,
    config: GeminiClientConfig,
}

impl GeminiClient {
    /// Build a client. Fails on a missing or placeholder API key.
    pub fn new(config: GeminiClientConfig) -> Result<Self, ProviderError> {
        if is_placeholder_key(&config.api_key) {
            return Err(ProviderError::Configuration(
                "Gemini API key is missing or a placeholder".to_string(),
            ));
        }

        let http_client = ReqwestClient::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        debug!(model = %config.model, api_key = %scrub_key(&config.api_key), "Gemini client ready");
        Ok(Self { http_client, config })
    }

    pub fn from_ai_config(ai: &AiConfig) -> Result<Self, ProviderError> {
        Self::new(GeminiClientConfig::from_ai_config(ai)?)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            let millis = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
            ProviderError::Timeout(millis)
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Map a non-success HTTP status to a provider error.
pub fn error_from_status(status: StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Authentication(body),
        429 => ProviderError::RateLimited(body),
        code if status.is_server_error() => ProviderError::Server { status: code, message: body },
        _ => ProviderError::InvalidRequest(format!("HTTP {status}: {body}")),
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateContentRequest::from_prompt(prompt, Some(self.config.generation.clone()));

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            warn!(%status, "Gemini request failed");
            return Err(error_from_status(status, body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Malformed response body: {e}")))?;

        if let Some(reason) = parsed.prompt_feedback.as_ref().and_then(|f| f.block_reason.clone()) {
            return Err(ProviderError::InvalidResponse(format!("Prompt blocked: {reason}")));
        }

        let text = parsed
            .text()
            .ok_or_else(|| ProviderError::InvalidResponse("Response contained no text".to_string()))?;
        debug!(response_len = text.len(), "Gemini response received");
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
