//! Gemini provider implementation using the `generateContent` API.

use serde::{Deserialize, Serialize};

use super::{
    check_http_response, CallError, CompletionRequest, LlmProvider, ProviderKind, Role,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `generateContent` request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    /// Conversation turns.
    pub contents: Vec<GeminiContent>,
    /// Sampling parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

/// One turn of content.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// `user` or `model`; absent for the system instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts.
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A text part.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text, absent for non-text parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Generation settings.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// `generateContent` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Generated candidates.
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// One generated candidate.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// Candidate content; missing when the candidate was blocked.
    pub content: Option<GeminiContent>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Gemini `generateContent` provider.
#[derive(Clone)]
pub struct GeminiProvider {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider instance.
    pub fn new(model: String, api_key: String, client: reqwest::Client) -> Self {
        Self {
            model,
            api_key,
            client,
        }
    }
}

fn text_content(role: Option<&str>, text: &str) -> GeminiContent {
    GeminiContent {
        role: role.map(str::to_owned),
        parts: vec![GeminiPart {
            text: Some(text.to_owned()),
        }],
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a `generateContent` request from a completion request.
///
/// System messages are joined into `systemInstruction`; assistant turns use
/// the `model` role.
#[doc(hidden)]
pub fn build_request(request: &CompletionRequest) -> GeminiRequest {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut contents: Vec<GeminiContent> = Vec::new();

    for msg in &request.messages {
        match msg.role {
            Role::System => system_parts.push(&msg.content),
            Role::User => contents.push(text_content(Some("user"), &msg.content)),
            Role::Assistant => contents.push(text_content(Some("model"), &msg.content)),
        }
    }

    let params = request.params;
    let generation_config = if params.temperature.is_some() || params.max_tokens.is_some() {
        Some(GeminiGenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_tokens,
        })
    } else {
        None
    };

    GeminiRequest {
        system_instruction: if system_parts.is_empty() {
            None
        } else {
            Some(text_content(None, &system_parts.join("\n\n")))
        },
        contents,
        generation_config,
    }
}

/// Join the text parts of the first candidate.
///
/// # Errors
///
/// Returns `CallError::Parse` if the body cannot be deserialized and
/// `CallError::EmptyCompletion` if the first candidate has no text.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, CallError> {
    let resp: GeminiResponse =
        serde_json::from_str(body).map_err(|e| CallError::Parse(e.to_string()))?;

    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(CallError::EmptyCompletion);
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CallError> {
        let api_request = build_request(&request);
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);

        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
