//! The model-inference collaborator seam.
//!
//! The pipeline talks to the model service through the [`InferenceProvider`]
//! trait and receives the reply verbatim — no interpretation happens at this
//! layer. The provider is an explicit dependency resolved once at startup and
//! shared read-only ([`std::sync::Arc`]) thereafter; nothing in this crate
//! reads credentials from hidden global state after construction.
//!
//! [`OpenAiProvider`] is the shipped implementation, speaking the chat
//! completions HTTP API. Tests substitute a scripted provider; see
//! `tests/pipeline.rs`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::CarscanError;

/// Default model when neither config nor environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// One completion request, fully constructed by the dispatcher.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System message; `None` sends the user message alone.
    pub system: Option<String>,
    /// The user instruction text.
    pub user_text: String,
    /// Image attachment for the vision path.
    pub image: Option<ImageAttachment>,
    /// Ask the provider for its native JSON mode (text path only — vision
    /// endpoints do not support it uniformly).
    pub force_json: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A base64-encoded image payload plus its declared mime type.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub base64: String,
    pub mime: &'static str,
}

impl ImageAttachment {
    pub fn from_bytes(bytes: &[u8], mime: &'static str) -> Self {
        Self {
            base64: STANDARD.encode(bytes),
            mime,
        }
    }

    /// Render as a `data:` URL for embedding in the request body.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// The model's reply: raw text plus token accounting when the provider
/// reports it.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Failures from a provider call.
///
/// The split between transient and fatal drives the retry wrapper: timeouts,
/// connection errors, 429 and 5xx are worth retrying; authentication and
/// other 4xx are not.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("request to {provider} timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    #[error("could not reach {provider}: {reason}")]
    Connection { provider: String, reason: String },

    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("authentication rejected by {provider}: {detail}")]
    Auth { provider: String, detail: String },

    #[error("unexpected response from {provider}: {detail}")]
    Malformed { provider: String, detail: String },
}

impl ProviderError {
    /// Whether a retry has any chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout { .. } | ProviderError::Connection { .. } => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Auth { .. } | ProviderError::Malformed { .. } => false,
        }
    }
}

/// The model service, as the pipeline sees it.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name for logs and error messages.
    fn name(&self) -> &str;

    /// Send one completion request and return the reply verbatim.
    async fn complete(&self, request: &CompletionRequest) -> Result<ModelReply, ProviderError>;
}

// ── OpenAI implementation ────────────────────────────────────────────────

/// Chat-completions client for the OpenAI API (and compatible endpoints).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, CarscanError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CarscanError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            timeout_secs,
        })
    }

    /// Point at a compatible non-OpenAI endpoint (vLLM, LiteLLM, …).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build from `OPENAI_API_KEY`, honouring a `CARSCAN_MODEL` override when
    /// the caller did not name a model.
    pub fn from_env(model: Option<&str>, timeout_secs: u64) -> Result<Self, CarscanError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CarscanError::ProviderNotConfigured {
                hint: "Set OPENAI_API_KEY, or pass a pre-built provider in the config.".to_string(),
            })?;

        let model = match model {
            Some(m) => m.to_string(),
            None => std::env::var("CARSCAN_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        Self::new(api_key, model, timeout_secs)
    }
}

// Request/response bodies for the chat completions endpoint. Only the fields
// this crate reads/writes are modelled.

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Content<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Content<'a> {
    Text(&'a str),
    Parts(Vec<Part>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Part {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

fn build_messages(request: &CompletionRequest) -> Vec<Message<'_>> {
    let mut messages = Vec::with_capacity(2);

    if let Some(ref system) = request.system {
        messages.push(Message {
            role: "system",
            content: Content::Text(system),
        });
    }

    let content = match request.image {
        Some(ref image) => Content::Parts(vec![
            Part::Text {
                text: request.user_text.clone(),
            },
            Part::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            },
        ]),
        None => Content::Text(&request.user_text),
    };

    messages.push(Message {
        role: "user",
        content,
    });

    messages
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<ModelReply, ProviderError> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: build_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .force_json
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, vision = request.image.is_some(), "calling chat completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: self.name().to_string(),
                        secs: self.timeout_secs,
                    }
                } else {
                    ProviderError::Connection {
                        provider: self.name().to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth {
                provider: self.name().to_string(),
                detail,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: self.name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::Malformed {
                    provider: self.name().to_string(),
                    detail: e.to_string(),
                })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed {
                provider: self.name().to_string(),
                detail: "response contained no choices".to_string(),
            })?;

        let usage = parsed.usage.unwrap_or_default();

        Ok(ModelReply {
            content: content.trim().to_string(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}
