use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, Result, ReviewError};
use crate::prompt::{self, Prompt};
use crate::retry::{RetryError, RetryPolicy};

/// Adapter for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    retry: RetryPolicy,
}

/// Request body for `generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    system_instruction: RequestContent<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

impl<'a> GenerateContentRequest<'a> {
    pub fn new(prompt: &'a Prompt) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: &prompt.user_message,
                }],
            }],
            system_instruction: RequestContent {
                parts: vec![RequestPart {
                    text: &prompt.system_instruction,
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: prompt::response_schema(),
            },
        }
    }
}

impl GeminiClient {
    /// Build a client from explicit configuration. Fails when no API key is configured.
    pub fn new(config: &ApiConfig, retry: RetryPolicy) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ReviewError::Configuration("Gemini API key is not set".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ReviewError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            retry,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send the prompt and return the raw response body, retrying transient failures
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    pub async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let body = GenerateContentRequest::new(prompt);
        let url = self.url();
        let (url, body) = (url.as_str(), &body);

        info!("Requesting feedback from Gemini");

        match self
            .retry
            .run(move |attempt| self.attempt(url, body, attempt))
            .await
        {
            Ok(text) => {
                info!(bytes = text.len(), "Gemini request complete");
                Ok(text)
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                warn!(attempts, error = %last, "Gemini API unavailable, giving up");
                Err(ReviewError::RetryExhausted { attempts, last })
            }
            Err(RetryError::Permanent(e)) => Err(ReviewError::TransientApi(e)),
        }
    }

    async fn attempt(
        &self,
        url: &str,
        body: &GenerateContentRequest<'_>,
        attempt: u32,
    ) -> std::result::Result<String, ApiError> {
        debug!(attempt, "Sending request to Gemini API");

        // Errors are stripped of their URL so the key never reaches the logs
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.without_url()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, "Gemini API returned an error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}
