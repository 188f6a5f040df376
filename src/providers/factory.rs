//! Provider construction from configuration.
//!
//! Resolved once at startup; everything downstream only sees the
//! [`LlmProvider`] trait object.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ApiKey, Config};

use super::anthropic::{self, AnthropicProvider};
use super::gemini::GeminiProvider;
use super::openai::{OpenAiProvider, OPENAI_API_BASE};
use super::{LlmProvider, ProviderError, ProviderKind};

/// Per-request HTTP timeout. Expiry surfaces as a `CallError::Request`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default model for [`ProviderKind::OpenAi`].
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
/// Default model for [`ProviderKind::Gemini`].
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
/// Default model for [`ProviderKind::Anthropic`].
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
/// Default model for [`ProviderKind::Groq`].
pub const DEFAULT_GROQ_MODEL: &str = "gpt-oss-120b";

/// Build the provider named by `config.llm_provider`.
///
/// # Errors
///
/// Returns [`ProviderError::UnsupportedProvider`] for an unknown name,
/// [`ProviderError::MissingSetting`] when a credential or required setting is
/// absent, and [`ProviderError::Client`] if the HTTP client cannot be built.
pub fn build_provider(config: &Config) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    let kind: ProviderKind = config.llm_provider.parse()?;
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(ProviderError::Client)?;

    let provider: Arc<dyn LlmProvider> = match kind {
        ProviderKind::AzureOpenAi => {
            let azure = &config.azure_openai;
            let endpoint = required(kind, "azure_openai.endpoint", azure.endpoint.as_deref())?;
            let api_key = required_key(kind, "azure_openai.api_key", azure.api_key.as_ref())?;
            let api_version =
                required(kind, "azure_openai.api_version", azure.api_version.as_deref())?;
            let deployment = required(
                kind,
                "azure_openai.deployment_name",
                azure.deployment_name.as_deref(),
            )?;
            Arc::new(OpenAiProvider::azure(
                endpoint,
                deployment.to_owned(),
                api_version,
                api_key,
                client,
            ))
        }
        ProviderKind::OpenAi => {
            let openai = &config.openai;
            let api_key = required_key(kind, "openai.api_key", openai.api_key.as_ref())?;
            let model = openai.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
            let base_url = openai.base_url.as_deref().unwrap_or(OPENAI_API_BASE);
            Arc::new(OpenAiProvider::openai(
                model.to_owned(),
                base_url,
                api_key,
                client,
            ))
        }
        ProviderKind::Gemini => {
            let gemini = &config.gemini;
            let api_key = required_key(kind, "gemini.api_key", gemini.api_key.as_ref())?;
            let model = gemini.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
            Arc::new(GeminiProvider::new(model.to_owned(), api_key, client))
        }
        ProviderKind::Anthropic => {
            let cfg = &config.anthropic;
            let api_key = required_key(kind, "anthropic.api_key", cfg.api_key.as_ref())?;
            let model = cfg.model.as_deref().unwrap_or(DEFAULT_ANTHROPIC_MODEL);
            let max_tokens = cfg.max_tokens.unwrap_or(anthropic::DEFAULT_MAX_TOKENS);
            Arc::new(AnthropicProvider::new(
                model.to_owned(),
                api_key,
                max_tokens,
                client,
            ))
        }
        ProviderKind::Groq => {
            let groq = &config.groq;
            let api_key = required_key(kind, "groq.api_key", groq.api_key.as_ref())?;
            let model = groq.model.as_deref().unwrap_or(DEFAULT_GROQ_MODEL);
            Arc::new(OpenAiProvider::groq(model.to_owned(), api_key, client))
        }
    };

    tracing::info!(provider = %kind, model = provider.model_id(), "LLM provider ready");
    Ok(provider)
}

fn required<'a>(
    provider: ProviderKind,
    key: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ProviderError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ProviderError::MissingSetting { provider, key })
}

fn required_key(
    provider: ProviderKind,
    key: &'static str,
    value: Option<&ApiKey>,
) -> Result<String, ProviderError> {
    required(provider, key, value.map(ApiKey::expose)).map(str::to_owned)
}
