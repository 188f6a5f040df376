//! Provider construction from configuration.

use persona_sim::config::{ApiKey, Config};
use persona_sim::providers::factory::{build_provider, DEFAULT_GROQ_MODEL, DEFAULT_OPENAI_MODEL};
use persona_sim::providers::{ProviderError, ProviderKind};

fn config_for(provider: &str) -> Config {
    let mut config = Config {
        llm_provider: provider.to_owned(),
        ..Config::default()
    };
    config.openai.api_key = Some(ApiKey::new("sk-test"));
    config.gemini.api_key = Some(ApiKey::new("gemini-test"));
    config.anthropic.api_key = Some(ApiKey::new("anthropic-test"));
    config.groq.api_key = Some(ApiKey::new("gsk-test"));
    config
}

#[test]
fn builds_each_single_key_provider() {
    for (name, kind) in [
        ("openai", ProviderKind::OpenAi),
        ("gemini", ProviderKind::Gemini),
        ("anthropic", ProviderKind::Anthropic),
        ("groq", ProviderKind::Groq),
    ] {
        let provider = match build_provider(&config_for(name)) {
            Ok(provider) => provider,
            Err(err) => panic!("{name} should build: {err}"),
        };
        assert_eq!(provider.kind(), kind);
    }
}

#[test]
fn default_models_apply_when_unset() {
    let openai = build_provider(&config_for("openai")).ok().expect("should build");
    assert_eq!(openai.model_id(), DEFAULT_OPENAI_MODEL);
    let groq = build_provider(&config_for("groq")).ok().expect("should build");
    assert_eq!(groq.model_id(), DEFAULT_GROQ_MODEL);
}

#[test]
fn configured_model_overrides_default() {
    let mut config = config_for("openai");
    config.openai.model = Some("gpt-4.1-mini".to_owned());
    let provider = build_provider(&config).ok().expect("should build");
    assert_eq!(provider.model_id(), "gpt-4.1-mini");
}

#[test]
fn azure_requires_every_setting() {
    let mut config = config_for("azure_openai");
    config.azure_openai.endpoint = Some("https://example.openai.azure.com".to_owned());
    config.azure_openai.api_key = Some(ApiKey::new("azure-key"));
    config.azure_openai.api_version = Some("2024-02-01".to_owned());

    let err = build_provider(&config).err().expect("deployment is missing");
    assert!(matches!(
        err,
        ProviderError::MissingSetting {
            provider: ProviderKind::AzureOpenAi,
            key: "azure_openai.deployment_name"
        }
    ));

    config.azure_openai.deployment_name = Some("gpt4o".to_owned());
    let provider = build_provider(&config).ok().expect("should build");
    assert_eq!(provider.kind(), ProviderKind::AzureOpenAi);
    assert_eq!(provider.model_id(), "gpt4o");
}

#[test]
fn blank_key_counts_as_missing() {
    let mut config = config_for("gemini");
    config.gemini.api_key = Some(ApiKey::new("   "));
    let err = build_provider(&config).err().expect("should fail");
    assert!(matches!(err, ProviderError::MissingSetting { key: "gemini.api_key", .. }));
}
