//! Client side of the translation oracle.
//!
//! The oracle is any OpenAI-compatible chat-completion endpoint that honours a
//! `json_schema` response format. [`CompletionClient`] is the seam the
//! translator talks through; [`OpenAiClient`] is the production
//! implementation, tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

// ---

/// Immutable oracle settings, created once at startup.
#[derive(Clone)]
pub struct OracleConfig {
    // ---
    pub api_key: String,
    pub model: String,
    /// API root without trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("api_key", &"****")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Everything that can go wrong between asking and getting a structured answer.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("oracle provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("oracle response contained no candidates")]
    NoCandidate,

    #[error("oracle refused to answer: {0}")]
    Refused(String),

    #[error("oracle response did not match the expected shape: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Structured-output directive: reply with JSON matching `schema`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub json_schema: JsonSchemaFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchemaFormat {
    pub name: &'static str,
    pub strict: bool,
    pub schema: Value,
}

impl ResponseFormat {
    /// Descriptor for the two-field translation result.
    pub fn translated_query() -> Self {
        // ---
        ResponseFormat {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: "translated_query",
                strict: true,
                schema: json!({
                    "type": "object",
                    "properties": {
                        "queryText": {
                            "type": "string",
                            "description": "The SQL query answering the question, or an empty string when none can be produced."
                        },
                        "isValid": {
                            "type": "boolean",
                            "description": "True only if queryText is valid SQL for the schema and follows every rule in the instructions."
                        }
                    },
                    "required": ["queryText", "isValid"],
                    "additionalProperties": false
                }),
            },
        }
    }
}

/// Body of one `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}

impl CompletionResponse {
    /// Wrap one assistant content string, as a provider would return it.
    pub fn with_content(content: impl Into<String>) -> Self {
        // ---
        CompletionResponse {
            choices: vec![Choice {
                message: AssistantMessage {
                    content: Some(content.into()),
                    refusal: None,
                },
            }],
        }
    }
}

/// One request in, one response out. Implementations must not retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, OracleError>;
}

/// Production client for OpenAI-compatible providers.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OracleConfig,
}

impl OpenAiClient {
    /// Build a client over a fresh connection pool.
    ///
    /// No request timeout is configured; callers that need one should pass
    /// their own `reqwest::Client` via [`OpenAiClient::with_http_client`].
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        // ---
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(http, config))
    }

    pub fn with_http_client(http: reqwest::Client, config: OracleConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, OracleError> {
        // ---
        let url = self.endpoint();
        tracing::debug!(model = %request.model, %url, "Sending completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = provider_error_message(&body);
            tracing::warn!(status = status.as_u16(), "Oracle provider error: {}", message);
            return Err(OracleError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<CompletionResponse>(&body)
            .map_err(|e| OracleError::Malformed(format!("unreadable completion body: {e}")))
    }
}

/// Pull `error.message` out of a provider error body, falling back to the raw text.
fn provider_error_message(body: &str) -> String {
    // ---
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
