//! OpenAiCompletion - Direct REST client for OpenAI-compatible chat completions.
//!
//! Each `complete` call sends the rendered prompt as a single user message.
//! Configuration priority for the API key: secret.json > `OPENAI_API_KEY`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use sqlchat_core::completion::{CompletionError, CompletionService};
use sqlchat_core::config::{CompletionConfig, SecretConfig};
use std::env;
use std::fmt;
use std::time::Duration;

/// Completion client that talks to an OpenAI-compatible HTTP API.
#[derive(Clone)]
pub struct OpenAiCompletion {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAiCompletion {
    /// Creates a client for the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: sqlchat_core::config::DEFAULT_COMPLETION_URL.to_string(),
            max_tokens: None,
        }
    }

    /// Builds a client from `config.toml` settings and loaded secrets.
    ///
    /// Priority:
    /// 1. `secret.json` (`openai.api_key`, `openai.model_name`)
    /// 2. Environment variables (`OPENAI_API_KEY`, `OPENAI_MODEL_NAME`)
    ///
    /// The model from the secret file or environment wins over `config.model`.
    pub fn from_config(
        config: &CompletionConfig,
        secrets: &SecretConfig,
    ) -> Result<Self, CompletionError> {
        let (api_key, model_override) = match &secrets.openai {
            Some(openai) => (openai.api_key.clone(), openai.model_name.clone()),
            None => {
                let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
                    CompletionError::Other(
                        "OPENAI_API_KEY not found in secret.json or environment variables".into(),
                    )
                })?;
                (api_key, env::var("OPENAI_MODEL_NAME").ok())
            }
        };

        if api_key.trim().is_empty() {
            return Err(CompletionError::Other("OpenAI API key is empty".into()));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| CompletionError::Other(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            api_key,
            model: model_override.unwrap_or_else(|| config.model.clone()),
            base_url: config.base_url.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Points the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| CompletionError::Process {
                status_code: None,
                message: format!("OpenAI API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
                retry_after: None,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            CompletionError::Other(format!("Failed to parse OpenAI response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

impl fmt::Debug for OpenAiCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompletion")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = self.build_request(prompt);

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "sending completion request");
        let text = self.send_request(&request).await?;
        tracing::debug!(model = %self.model, response_len = text.len(), "completion received");

        Ok(text)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(CompletionError::Empty)
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> CompletionError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    CompletionError::Process {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // HTTP-date form is not supported
    value.parse::<u64>().ok().map(Duration::from_secs)
}
