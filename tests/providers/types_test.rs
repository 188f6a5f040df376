//! Message, parameter and provider kind tests.

use persona_sim::providers::{
    CompletionParams, Message, ProviderError, ProviderKind, Role, TokenLimitKey,
};

#[test]
fn message_constructors_set_role() {
    assert_eq!(Message::system("s").role, Role::System);
    assert_eq!(Message::user("u").role, Role::User);
    assert_eq!(Message::assistant("a").role, Role::Assistant);
    assert_eq!(Message::user("hello").content, "hello");
}

#[test]
fn params_fill_unset_fields_from_defaults() {
    let defaults = CompletionParams {
        temperature: Some(0.7),
        max_tokens: Some(1000),
        ..CompletionParams::default()
    };
    let call = CompletionParams {
        temperature: None,
        max_tokens: Some(50),
        ..CompletionParams::default()
    };
    let merged = call.or(defaults);
    assert_eq!(merged.temperature, Some(0.7));
    assert_eq!(merged.max_tokens, Some(50));
}

#[test]
fn token_limit_key_follows_the_side_that_set_max_tokens() {
    let defaults = CompletionParams {
        max_tokens: Some(1000),
        token_limit_key: TokenLimitKey::MaxCompletionTokens,
        ..CompletionParams::default()
    };

    let inherited = CompletionParams::default().or(defaults);
    assert_eq!(inherited.token_limit_key, TokenLimitKey::MaxCompletionTokens);

    let own = CompletionParams {
        max_tokens: Some(50),
        ..CompletionParams::default()
    }
    .or(defaults);
    assert_eq!(own.max_tokens, Some(50));
    assert_eq!(own.token_limit_key, TokenLimitKey::MaxTokens);
}

#[test]
fn provider_kind_round_trips_config_names() {
    for kind in ProviderKind::ALL {
        let parsed: ProviderKind = kind.as_str().parse().expect("should parse");
        assert_eq!(parsed, kind);
        assert_eq!(kind.to_string(), kind.as_str());
    }
}

#[test]
fn provider_kind_accepts_azure_alias() {
    let parsed: ProviderKind = "azure".parse().expect("should parse");
    assert_eq!(parsed, ProviderKind::AzureOpenAi);
}

#[test]
fn unknown_provider_lists_supported_names() {
    let err = "bedrock".parse::<ProviderKind>().expect_err("should fail");
    assert!(matches!(err, ProviderError::UnsupportedProvider { ref provider } if provider == "bedrock"));
    let message = err.to_string();
    for kind in ProviderKind::ALL {
        assert!(message.contains(kind.as_str()), "missing {kind}");
    }
}
