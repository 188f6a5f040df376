//! LLM provider abstraction layer.
//!
//! Defines the [`LlmProvider`] trait, the shared message types, and the
//! [`Gateway`] every engine talks through.
//!
//! The closed set of backends is [`ProviderKind`]:
//! - [`openai::OpenAiProvider`]: chat completions API, also serving Azure
//!   OpenAI and Groq through their compatible endpoints
//! - [`anthropic::AnthropicProvider`]: Anthropic `/v1/messages` API
//! - [`gemini::GeminiProvider`]: Gemini `generateContent` API
//!
//! [`factory::build_provider`] picks one from configuration at startup.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod anthropic;
pub mod factory;
pub mod gateway;
pub mod gemini;
pub mod openai;

pub use gateway::Gateway;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Conversation participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// Human side of the conversation.
    User,
    /// Model output.
    Assistant,
}

/// A role-tagged text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// Text payload.
    pub content: String,
}

impl Message {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user (human) message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant (model) message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Wire name of the completion token cap on OpenAI-compatible APIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenLimitKey {
    /// `max_tokens`.
    #[default]
    MaxTokens,
    /// `max_completion_tokens`, required by newer OpenAI models.
    MaxCompletionTokens,
}

/// Optional sampling parameters, passed to the provider unmodified.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionParams {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum tokens in the completion.
    pub max_tokens: Option<u32>,
    /// How `max_tokens` is spelled where the API distinguishes. Providers
    /// with a single spelling ignore it.
    pub token_limit_key: TokenLimitKey,
}

impl CompletionParams {
    /// Fill unset fields from `defaults`.
    ///
    /// The token limit key travels with whichever side supplied `max_tokens`.
    pub fn or(self, defaults: CompletionParams) -> CompletionParams {
        let token_limit_key = if self.max_tokens.is_some() {
            self.token_limit_key
        } else {
            defaults.token_limit_key
        };
        CompletionParams {
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
            token_limit_key,
        }
    }
}

/// A request to an LLM provider for a completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Ordered conversation, system messages included.
    pub messages: Vec<Message>,
    /// Sampling parameters.
    pub params: CompletionParams,
}

// ---------------------------------------------------------------------------
// Provider kinds
// ---------------------------------------------------------------------------

/// The supported backends, selected by `llm_provider` in the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Azure OpenAI deployment.
    AzureOpenAi,
    /// OpenAI (or any compatible base URL).
    OpenAi,
    /// Google Gemini.
    Gemini,
    /// Anthropic.
    Anthropic,
    /// Groq.
    Groq,
}

impl ProviderKind {
    /// Every supported kind, in config documentation order.
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::AzureOpenAi,
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::Anthropic,
        ProviderKind::Groq,
    ];

    /// Config name of this provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AzureOpenAi => "azure_openai",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
            Self::Groq => "groq",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "azure_openai" | "azure" => Ok(Self::AzureOpenAi),
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Anthropic),
            "groq" => Ok(Self::Groq),
            other => Err(ProviderError::UnsupportedProvider {
                provider: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while constructing a provider. Always fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Provider name is not one of [`ProviderKind::ALL`].
    #[error(
        "unsupported provider '{provider}'; supported providers: azure_openai, openai, gemini, anthropic, groq"
    )]
    UnsupportedProvider {
        /// Name that was requested.
        provider: String,
    },
    /// A credential or setting the provider needs is absent.
    #[error("missing setting for provider '{provider}': {key}")]
    MissingSetting {
        /// Provider name.
        provider: ProviderKind,
        /// Missing config key.
        key: &'static str,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors returned by a single model invocation. Recovered per persona.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// HTTP transport failure, including timeouts.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match expected schema.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream provider responded with an error status.
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// The provider answered without any text.
    #[error("provider returned an empty completion")]
    EmptyCompletion,
    /// The blocking entry point could not start its runtime.
    #[error("failed to start blocking runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `CallError::Request` on transport failure, `CallError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, CallError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(CallError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace, redact anything that looks like an API key, and
/// truncate an upstream error body before it reaches logs.
pub fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"sk-ant-[A-Za-z0-9_\-]{10,}",
        r"sk-[A-Za-z0-9_\-]{32,}",
        r"gsk_[A-Za-z0-9]{20,}",
        r"AIza[A-Za-z0-9_\-]{30,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Chat-completion capability implemented by every backend.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// persona task of a batch.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send the ordered messages and return the completion text.
    ///
    /// # Errors
    ///
    /// Returns [`CallError`] on API, network, or parse failure.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CallError>;

    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// The model or deployment identifier this provider is instantiated for.
    fn model_id(&self) -> &str;
}
