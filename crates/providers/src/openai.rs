//! OpenAI-compatible text-completion client.
//!
//! Talks to the legacy `/v1/completions` endpoint used by instruct models
//! such as `gpt-3.5-turbo-instruct`. Works with any server exposing the same
//! request and response shapes (OpenAI, vLLM, llama.cpp server, ...).
//!
//! Responses are decoded once, here, into typed structs; anything that does
//! not match the expected shape becomes [`ProviderError::MalformedResponse`].

use std::time::Duration;

use async_trait::async_trait;
use contextchat_config::AppConfig;
use contextchat_core::completion::{CompletionClient, CompletionRequest, CompletionResponse, Usage};
use contextchat_core::error::ProviderError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible completion client.
pub struct OpenAiCompletionClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompletionClient {
    /// Create a new client.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build a client from validated configuration and a credential.
    pub fn from_config(config: &AppConfig, api_key: &str) -> Result<Self, ProviderError> {
        Self::new(
            "openai",
            config.base_url.as_str(),
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/completions", self.base_url)
    }

    fn to_api_request(request: &CompletionRequest) -> ApiRequest<'_> {
        ApiRequest {
            model: &request.model,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

/// Map an HTTP status and body onto a completion or a typed error.
pub(crate) fn decode_response(status: u16, body: &str) -> Result<CompletionResponse, ProviderError> {
    match status {
        200..=299 => {}
        429 => {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }
        401 | 403 => {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        _ => {
            let message = serde_json::from_str::<ApiErrorEnvelope>(body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.to_string());
            return Err(ProviderError::ApiError {
                status_code: status,
                message,
            });
        }
    }

    let api_response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

    Ok(CompletionResponse {
        text: choice.text,
        model: api_response.model,
        finish_reason: choice.finish_reason,
        usage: api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    })
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        debug!(
            provider = %self.name,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            max_tokens = request.max_tokens,
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&Self::to_api_request(&request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(status, body = %body, "Provider returned error");
        }

        decode_response(status, &body)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    text: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
