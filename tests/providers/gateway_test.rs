//! Gateway parameter handling tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use persona_sim::providers::{
    CallError, CompletionParams, CompletionRequest, Gateway, LlmProvider, Message, ProviderKind,
    TokenLimitKey,
};

/// Records the last request and echoes the last message back.
#[derive(Default)]
struct RecordingProvider {
    last: Mutex<Option<CompletionRequest>>,
}

#[async_trait]
impl LlmProvider for RecordingProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CallError> {
        let reply = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        if let Ok(mut slot) = self.last.lock() {
            *slot = Some(request);
        }
        Ok(reply)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model_id(&self) -> &str {
        "recording"
    }
}

fn last_params(provider: &RecordingProvider) -> CompletionParams {
    provider
        .last
        .lock()
        .expect("lock")
        .as_ref()
        .expect("a request should have been sent")
        .params
}

const DEFAULTS: CompletionParams = CompletionParams {
    temperature: Some(0.7),
    max_tokens: Some(1000),
    token_limit_key: TokenLimitKey::MaxCompletionTokens,
};

#[tokio::test]
async fn complete_uses_configured_defaults() {
    let provider = Arc::new(RecordingProvider::default());
    let gateway = Gateway::new(provider.clone(), DEFAULTS);

    let reply = gateway
        .complete(vec![Message::system("sys"), Message::user("ping")])
        .await
        .expect("should complete");

    assert_eq!(reply, "ping");
    assert_eq!(last_params(&provider), DEFAULTS);
}

#[tokio::test]
async fn complete_with_overrides_only_set_fields() {
    let provider = Arc::new(RecordingProvider::default());
    let gateway = Gateway::new(provider.clone(), DEFAULTS);

    gateway
        .complete_with(
            vec![Message::user("ping")],
            CompletionParams {
                temperature: Some(0.0),
                max_tokens: None,
                ..CompletionParams::default()
            },
        )
        .await
        .expect("should complete");

    let params = last_params(&provider);
    assert_eq!(params.temperature, Some(0.0));
    assert_eq!(params.max_tokens, Some(1000));
    assert_eq!(params.token_limit_key, TokenLimitKey::MaxCompletionTokens);
}

#[test]
fn complete_blocking_works_outside_a_runtime() {
    let provider = Arc::new(RecordingProvider::default());
    let gateway = Gateway::new(provider, DEFAULTS);
    let reply = gateway
        .complete_blocking(vec![Message::user("sync")], CompletionParams::default())
        .expect("should complete");
    assert_eq!(reply, "sync");
}

#[test]
fn debug_names_provider_and_model() {
    let gateway = Gateway::new(Arc::new(RecordingProvider::default()), DEFAULTS);
    let debug = format!("{gateway:?}");
    assert!(debug.contains("OpenAi"));
    assert!(debug.contains("recording"));
}
