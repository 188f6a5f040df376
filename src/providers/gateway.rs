//! The single chat-completion entry point used by every engine.

use std::sync::Arc;

use super::{CallError, CompletionParams, CompletionRequest, LlmProvider, Message};

/// Provider handle plus the configured default sampling parameters.
///
/// Cheap to clone; clones share the underlying provider and HTTP client.
#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn LlmProvider>,
    defaults: CompletionParams,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("provider", &self.provider.kind())
            .field("model", &self.provider.model_id())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl Gateway {
    /// Wrap a provider with default parameters for every call.
    pub fn new(provider: Arc<dyn LlmProvider>, defaults: CompletionParams) -> Self {
        Self { provider, defaults }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Send `messages` with the default parameters.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`CallError`].
    pub async fn complete(&self, messages: Vec<Message>) -> Result<String, CallError> {
        self.complete_with(messages, CompletionParams::default())
            .await
    }

    /// Send `messages`; fields set in `params` override the defaults.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`CallError`].
    pub async fn complete_with(
        &self,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<String, CallError> {
        let request = CompletionRequest {
            messages,
            params: params.or(self.defaults),
        };
        tracing::debug!(
            provider = %self.provider.kind(),
            messages = request.messages.len(),
            "sending completion request"
        );
        self.provider.complete(request).await
    }

    /// Blocking variant of [`Gateway::complete_with`] for synchronous callers.
    ///
    /// Drives the call on a private current-thread runtime, so it must not be
    /// called from inside an async context.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Runtime`] if the runtime cannot start, otherwise
    /// the provider's error.
    pub fn complete_blocking(
        &self,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<String, CallError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CallError::Runtime)?;
        runtime.block_on(self.complete_with(messages, params))
    }
}
