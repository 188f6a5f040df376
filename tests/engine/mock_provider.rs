//! Scripted `LlmProvider` shared by the engine tests.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use persona_sim::persona::PersonaProfile;
use persona_sim::providers::{
    CallError, CompletionParams, CompletionRequest, Gateway, LlmProvider, ProviderKind,
};

type Responder = dyn Fn(&CompletionRequest) -> Result<String, CallError> + Send + Sync;

/// Answers every request through a closure, counting calls and tracking the
/// peak number of requests in flight.
pub struct MockProvider {
    responder: Box<Responder>,
    delay: Duration,
    pub calls: Arc<AtomicU32>,
    in_flight: AtomicUsize,
    pub peak_in_flight: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new(
        responder: impl Fn(&CompletionRequest) -> Result<String, CallError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicU32::new(0)),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answer with `text`.
    pub fn fixed(text: &'static str) -> Self {
        Self::new(move |_| Ok(text.to_owned()))
    }

    /// Hold every request for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn gateway(self: &Arc<Self>) -> Gateway {
        Gateway::new(self.clone(), CompletionParams::default())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = (self.responder)(&request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

/// Whether the system prompt of `request` mentions `needle`.
pub fn system_mentions(request: &CompletionRequest, needle: &str) -> bool {
    request
        .messages
        .first()
        .is_some_and(|m| m.content.contains(needle))
}

pub fn persona(id: &str, occupation: &str) -> PersonaProfile {
    PersonaProfile {
        id: id.to_owned(),
        age: Some(40),
        sex: "male".to_owned(),
        occupation: occupation.to_owned(),
        prefecture: "Hokkaido".to_owned(),
        personality: "Quiet and thoughtful, values long-term relationships above all".to_owned(),
        hobbies_and_interests: "fishing, reading historical novels, brewing coffee at home".to_owned(),
        ..PersonaProfile::default()
    }
}

pub fn personas(n: usize) -> Vec<PersonaProfile> {
    (0..n).map(|i| persona(&format!("p-{i}"), "clerk")).collect()
}
