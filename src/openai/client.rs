use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::OpenAiConfig;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("OpenAI API key not configured")]
    NotConfigured,
    #[error("OpenAI request timed out")]
    Timeout,
    #[error("could not connect to the OpenAI API")]
    Connection,
    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("OpenAI returned no completion")]
    Empty,
    #[error("OpenAI request failed: {0}")]
    Transport(String),
    #[error("invalid OpenAI response: {0}")]
    Decode(String),
}

/// One system + user exchange.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the assistant message text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireReply,
}

#[derive(Deserialize)]
struct WireReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireErrorBody {
    error: WireErrorDetail,
}

#[derive(Deserialize)]
struct WireErrorDetail {
    message: String,
}

/// Chat-completions client for the OpenAI HTTP API.
pub struct OpenAiClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(cfg: &OpenAiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout())
            .build()
            .context("build OpenAI HTTP client")?;
        let base = format!("{}/", cfg.api_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .and_then(|b| b.join("chat/completions"))
            .with_context(|| format!("parse OPENAI_API_URL {}", cfg.api_url))?;
        Ok(Self {
            client,
            endpoint,
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }
}

fn send_error(e: reqwest::Error) -> CompletionError {
    error!(error = %e, "OpenAI request failed");
    if e.is_timeout() {
        CompletionError::Timeout
    } else if e.is_connect() {
        CompletionError::Connection
    } else {
        CompletionError::Transport(e.to_string())
    }
}

fn extract_content(body: WireResponse) -> Result<String, CompletionError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(CompletionError::Empty)
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::NotConfigured)?;
        let body = WireRequest {
            model: &request.model,
            messages: [
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %request.model, "requesting chat completion");
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<WireErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            error!(%status, %message, "OpenAI returned an error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .json::<WireResponse>()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;
        extract_content(body)
    }
}
