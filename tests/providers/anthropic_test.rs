//! Anthropic provider wire format tests.

use persona_sim::providers::anthropic::{build_request, parse_response, DEFAULT_MAX_TOKENS};
use persona_sim::providers::{CallError, CompletionParams, CompletionRequest, Message};

fn request(max_tokens: Option<u32>) -> CompletionRequest {
    CompletionRequest {
        messages: vec![
            Message::system("You are a farmer."),
            Message::user("Why?"),
            Message::assistant("Because."),
            Message::system("Answer briefly."),
        ],
        params: CompletionParams {
            temperature: None,
            max_tokens,
            ..CompletionParams::default()
        },
    }
}

#[test]
fn build_request_lifts_system_messages() {
    let req = build_request("claude-sonnet", DEFAULT_MAX_TOKENS, &request(Some(512)));
    assert_eq!(req.model, "claude-sonnet");
    assert_eq!(
        req.system,
        Some("You are a farmer.\n\nAnswer briefly.".to_owned())
    );
    assert_eq!(req.messages.len(), 2);
    assert_eq!(req.messages[0].role, "user");
    assert_eq!(req.messages[1].role, "assistant");
    assert_eq!(req.max_tokens, 512);
}

#[test]
fn build_request_falls_back_to_default_max_tokens() {
    let req = build_request("claude-sonnet", DEFAULT_MAX_TOKENS, &request(None));
    assert_eq!(req.max_tokens, 8192);
}

#[test]
fn build_request_without_system_omits_field() {
    let req = CompletionRequest {
        messages: vec![Message::user("hi")],
        params: CompletionParams::default(),
    };
    let json = serde_json::to_value(build_request("m", 100, &req)).expect("should serialize");
    assert!(json.get("system").is_none());
}

#[test]
fn parse_response_joins_text_blocks_and_skips_others() {
    let body = r#"{
        "content": [
            {"type": "text", "text": "Score: 8\n"},
            {"type": "thinking", "thinking": "hmm"},
            {"type": "text", "text": "Impression: catchy"}
        ]
    }"#;
    let text = parse_response(body).expect("should parse");
    assert_eq!(text, "Score: 8\nImpression: catchy");
}

#[test]
fn parse_response_without_text_is_empty_completion() {
    let err = parse_response(r#"{"content": []}"#).expect_err("should fail");
    assert!(matches!(err, CallError::EmptyCompletion));
}
