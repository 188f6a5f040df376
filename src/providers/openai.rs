//! OpenAI-compatible provider using the `/chat/completions` API.
//!
//! The same wire format serves three backends: OpenAI itself (or any
//! compatible `base_url`), Groq's OpenAI endpoint, and Azure OpenAI
//! deployments, which differ only in URL shape and auth header.

use serde::{Deserialize, Serialize};

use super::{
    check_http_response, CallError, CompletionRequest, LlmProvider, ProviderKind, Role,
    TokenLimitKey,
};

/// Default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Groq's OpenAI-compatible base URL.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Chat completions request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OpenAiRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<OpenAiMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum completion tokens, legacy spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Maximum completion tokens, newer spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

/// A message in OpenAI chat format.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OpenAiMessage {
    /// Role (`system`, `user`, `assistant`).
    pub role: &'static str,
    /// Plain text content.
    pub content: String,
}

/// Chat completions response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiResponse {
    /// Response choices.
    pub choices: Vec<OpenAiChoice>,
}

/// A response choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiChoice {
    /// Assistant message for this choice.
    pub message: OpenAiResponseMessage,
}

/// Assistant message in a response choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiResponseMessage {
    /// Optional text content.
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// How the API key is presented.
#[derive(Clone)]
pub enum OpenAiAuth {
    /// `Authorization: Bearer <key>` (OpenAI, Groq).
    Bearer(String),
    /// `api-key: <key>` (Azure OpenAI).
    ApiKeyHeader(String),
}

impl std::fmt::Debug for OpenAiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Self::ApiKeyHeader(_) => f.write_str("ApiKeyHeader([REDACTED])"),
        }
    }
}

/// OpenAI-compatible chat completions provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    kind: ProviderKind,
    model: String,
    url: String,
    auth: OpenAiAuth,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Provider for OpenAI or a compatible server at `base_url`.
    pub fn openai(model: String, base_url: &str, api_key: String, client: reqwest::Client) -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            model,
            url: chat_completions_url(base_url),
            auth: OpenAiAuth::Bearer(api_key),
            client,
        }
    }

    /// Provider for Groq's OpenAI-compatible endpoint.
    pub fn groq(model: String, api_key: String, client: reqwest::Client) -> Self {
        Self {
            kind: ProviderKind::Groq,
            model,
            url: chat_completions_url(GROQ_API_BASE),
            auth: OpenAiAuth::Bearer(api_key),
            client,
        }
    }

    /// Provider for an Azure OpenAI deployment.
    pub fn azure(
        endpoint: &str,
        deployment: String,
        api_version: &str,
        api_key: String,
        client: reqwest::Client,
    ) -> Self {
        let url = azure_chat_completions_url(endpoint, &deployment, api_version);
        Self {
            kind: ProviderKind::AzureOpenAi,
            model: deployment,
            url,
            auth: OpenAiAuth::ApiKeyHeader(api_key),
            client,
        }
    }

    /// Fully resolved chat completions URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// `{base_url}/chat/completions`, tolerating a trailing slash.
#[doc(hidden)]
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Azure deployment URL with the `api-version` query parameter.
#[doc(hidden)]
pub fn azure_chat_completions_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a chat completions request from a completion request.
#[doc(hidden)]
pub fn build_request(model: &str, request: &CompletionRequest) -> OpenAiRequest {
    let messages = request
        .messages
        .iter()
        .map(|msg| OpenAiMessage {
            role: role_to_openai(msg.role),
            content: msg.content.clone(),
        })
        .collect();

    let params = request.params;
    let (max_tokens, max_completion_tokens) = match params.token_limit_key {
        TokenLimitKey::MaxTokens => (params.max_tokens, None),
        TokenLimitKey::MaxCompletionTokens => (None, params.max_tokens),
    };

    OpenAiRequest {
        model: model.to_owned(),
        messages,
        temperature: params.temperature,
        max_tokens,
        max_completion_tokens,
    }
}

/// Extract the first choice's text from a chat completions response.
///
/// # Errors
///
/// Returns `CallError::Parse` if the body cannot be deserialized or has no
/// choices, and `CallError::EmptyCompletion` when the first choice has no text.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, CallError> {
    let resp: OpenAiResponse =
        serde_json::from_str(body).map_err(|e| CallError::Parse(e.to_string()))?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CallError::Parse("missing choices[0]".to_owned()))?;

    match choice.message.content {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(CallError::EmptyCompletion),
    }
}

fn role_to_openai(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CallError> {
        let api_request = build_request(&self.model, &request);

        let builder = self
            .client
            .post(&self.url)
            .header("content-type", "application/json");
        let builder = match &self.auth {
            OpenAiAuth::Bearer(key) => builder.header("authorization", format!("Bearer {key}")),
            OpenAiAuth::ApiKeyHeader(key) => builder.header("api-key", key),
        };

        let response = builder.json(&api_request).send().await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
