//! Upstream model abstraction.
//!
//! The [`ModelClient`] trait decouples the solve service from the hosted
//! chat-completions API. Tests use scripted clients that return canned
//! output without touching the network.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::io::config::ModelConfig;

/// One vision request: fixed instruction, one image, structured output schema.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system_prompt: String,
    /// Image as a `data:` URL (or any URL the upstream can fetch).
    pub image_url: String,
    pub schema_name: String,
    pub schema: Value,
}

/// Abstraction over structured-output model backends.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn name(&self) -> &str;

    /// Send the request and return the raw structured output text.
    ///
    /// `Ok(None)` means the upstream answered but produced no usable content
    /// (empty message or refusal). Transport and HTTP failures are errors.
    async fn complete(&self, request: &ModelRequest) -> Result<Option<String>>;
}

#[async_trait]
impl<T: ModelClient + ?Sized> ModelClient for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn complete(&self, request: &ModelRequest) -> Result<Option<String>> {
        (**self).complete(request).await
    }
}

/// Chat-completions client (OpenAI-compatible `/chat/completions`).
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    image_detail: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            image_detail: "auto".to_string(),
        }
    }

    pub fn from_config(config: &ModelConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.name.clone(),
            image_detail: config.image_detail.clone(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_body(&self, request: &ModelRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(request.system_prompt.clone()),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image_url.clone(),
                            detail: self.image_detail.clone(),
                        },
                    }]),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: request.schema_name.clone(),
                    strict: true,
                    schema: request.schema.clone(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

/// Pull the structured output text out of a chat response.
fn extract_content(response: ChatResponse) -> Option<String> {
    let choice = response.choices.into_iter().next()?;
    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        warn!(refusal = %refusal, "model refused the request");
        return None;
    }
    if choice.finish_reason.as_deref() == Some("length") {
        warn!("model output was cut off at the token limit");
    }
    choice.message.content.filter(|c| !c.trim().is_empty())
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &ModelRequest) -> Result<Option<String>> {
        let start = Instant::now();
        let body = self.build_body(request);

        debug!(image_bytes = request.image_url.len(), "sending model request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("model HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("model API returned {}: {}", status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("parse model API response")?;

        let tokens_used = chat_response
            .usage
            .as_ref()
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);
        debug!(
            tokens_used,
            latency_ms = start.elapsed().as_millis() as u64,
            "model request completed"
        );

        Ok(extract_content(chat_response))
    }
}
