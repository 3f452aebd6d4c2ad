use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Provider;
use crate::app_config::ModelSettings;
use crate::errors::ProviderError;

/// Gemini client for the generative language REST API
#[derive(Debug, Clone)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint base URL
    endpoint: String,
    /// Model name used in the request path and as the rate-limit identity
    model: String,
    /// Generation parameters sent with every request
    generation_config: GenerationConfig,
    /// Per-call timeout, kept for error reporting
    timeout: Duration,
}

/// Generation parameters for a request
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,

    /// Top probability mass to consider (nucleus sampling)
    pub top_p: f32,

    /// Top k tokens to consider
    pub top_k: u32,

    /// Maximum number of tokens to generate
    pub max_output_tokens: u32,

    /// Response MIME type
    pub response_mime_type: String,
}

/// Safety setting entry, all categories relaxed for fiction translation
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Request body for the generateContent endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

/// Response body from the generateContent endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl Gemini {
    /// Create a new Gemini client from tier settings
    pub fn new(
        settings: &ModelSettings,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: settings.model.clone(),
            generation_config: GenerationConfig {
                temperature: settings.temperature,
                top_p: settings.top_p,
                top_k: settings.top_k,
                max_output_tokens: settings.max_output_tokens,
                response_mime_type: "text/plain".to_string(),
            },
            timeout,
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: self.generation_config.clone(),
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .copied()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }

    /// Map a refusal signalled by the API into a classified error. The
    /// wording matters: failure categorization keys off it downstream.
    fn refusal_error(reason: &str) -> ProviderError {
        match reason {
            "RECITATION" => {
                ProviderError::PromptBlocked("copyrighted content (recitation)".to_string())
            }
            _ => ProviderError::PromptBlocked(format!("prohibited content ({})", reason)),
        }
    }
}

#[async_trait]
impl Provider for Gemini {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(self.request_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout.as_secs())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 | 503 => ProviderError::RateLimitExceeded(message),
                401 | 403 => ProviderError::AuthenticationError(message),
                code => ProviderError::ApiError {
                    status_code: code,
                    message,
                },
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(feedback) = &body.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(Self::refusal_error(reason));
            }
        }

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" && reason != "MAX_TOKENS" {
                return Err(Self::refusal_error(reason));
            }
        }

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        debug!("Gemini {} returned {} chars", self.model, text.len());
        Ok(text)
    }
}
