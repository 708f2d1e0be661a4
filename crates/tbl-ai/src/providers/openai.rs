//! OpenAI Chat Completions API provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::CompletionClient;
use crate::{
    error::{Error, Result},
    types::{CompletionResult, DEFAULT_TEMPERATURE, Message, Usage},
};

/// Default endpoint for the public OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI API client
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Point the client at a compatible endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request<'a>(&self, conversation: &'a [Message], model: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages: conversation
                .iter()
                .map(|m| ChatMessage {
                    role: m.role().as_str(),
                    content: m.content(),
                })
                .collect(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if e.is_timeout() => Error::Timeout(timeout),
            _ => Error::Http(e),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAIProvider {
    async fn complete(&self, conversation: &[Message], model: &str) -> Result<CompletionResult> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(conversation, model);

        tracing::debug!(
            model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_status(status.as_u16(), retry_after, &text));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let result = parsed.into_result()?;

        tracing::debug!(
            prompt_tokens = result.usage.prompt_tokens,
            completion_tokens = result.usage.completion_tokens,
            "Chat completion received"
        );

        Ok(result)
    }
}

/// Translate a non-success HTTP response into an error
fn error_from_status(status: u16, retry_after: Option<u64>, body: &str) -> Error {
    let (error_type, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (
            envelope
                .error
                .error_type
                .or(envelope.error.code)
                .unwrap_or_else(|| format!("http_{}", status)),
            envelope.error.message,
        ),
        Err(_) => (
            format!("http_{}", status),
            if body.is_empty() {
                format!("HTTP status {}", status)
            } else {
                body.to_string()
            },
        ),
    };

    match status {
        401 | 403 => Error::Auth(message),
        429 if error_type != "insufficient_quota" => Error::RateLimited { retry_after },
        _ => Error::Api {
            error_type,
            message,
        },
    }
}

// Request types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

// Response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatResponse {
    fn into_result(self) -> Result<CompletionResult> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse("response contained no choices".into()))?;
        let content = choice.message.content.ok_or_else(|| {
            Error::UnexpectedResponse("assistant message had no content".into())
        })?;
        let usage = self
            .usage
            .ok_or_else(|| Error::UnexpectedResponse("response is missing token usage".into()))?;

        Ok(CompletionResult {
            content,
            usage: Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}
