//! Anthropic provider implementation using the `/v1/messages` API.

use serde::{Deserialize, Serialize};

use super::{
    check_http_response, CallError, CompletionRequest, LlmProvider, ProviderKind, Role,
};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory for this API; used when neither the call nor the
/// config sets one.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Anthropic messages API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages (user/assistant only).
    pub messages: Vec<AnthropicMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// System prompt, lifted out of the message list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A message in Anthropic format.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Text content.
    pub content: String,
}

/// Anthropic API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// Content blocks in the response.
    pub content: Vec<AnthropicContentBlock>,
}

/// A content block in the Anthropic response.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContentBlock {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// Any other block type; ignored.
    #[serde(other)]
    Other,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Anthropic messages API provider.
#[derive(Clone)]
pub struct AnthropicProvider {
    model: String,
    api_key: String,
    default_max_tokens: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .field("default_max_tokens", &self.default_max_tokens)
            .finish()
    }
}

impl AnthropicProvider {
    /// Create a new Anthropic provider instance.
    pub fn new(
        model: String,
        api_key: String,
        default_max_tokens: u32,
        client: reqwest::Client,
    ) -> Self {
        Self {
            model,
            api_key,
            default_max_tokens,
            client,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build an Anthropic API request from a completion request.
///
/// System messages are joined into the top-level `system` field; the API
/// does not accept them inline.
#[doc(hidden)]
pub fn build_request(
    model: &str,
    default_max_tokens: u32,
    request: &CompletionRequest,
) -> AnthropicRequest {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut messages: Vec<AnthropicMessage> = Vec::new();

    for msg in &request.messages {
        match msg.role {
            Role::System => system_parts.push(&msg.content),
            Role::User => messages.push(AnthropicMessage {
                role: "user".to_owned(),
                content: msg.content.clone(),
            }),
            Role::Assistant => messages.push(AnthropicMessage {
                role: "assistant".to_owned(),
                content: msg.content.clone(),
            }),
        }
    }

    AnthropicRequest {
        model: model.to_owned(),
        messages,
        max_tokens: request.params.max_tokens.unwrap_or(default_max_tokens),
        system: if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        },
        temperature: request.params.temperature,
    }
}

/// Join the text blocks of an Anthropic API response.
///
/// # Errors
///
/// Returns `CallError::Parse` if the response cannot be deserialized and
/// `CallError::EmptyCompletion` if it carries no text.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, CallError> {
    let resp: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| CallError::Parse(e.to_string()))?;

    let text: String = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect();

    if text.is_empty() {
        return Err(CallError::EmptyCompletion);
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CallError> {
        let api_request = build_request(&self.model, self.default_max_tokens, &request);

        let response = self
            .client
            .post(ANTHROPIC_API_BASE)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
