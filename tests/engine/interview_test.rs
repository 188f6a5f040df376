//! Interview state machine tests.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use persona_sim::engine::interview::{
    role_counts, InterviewEngine, InterviewState, InterviewStep,
};
use persona_sim::providers::{CallError, Role};
use persona_sim::prompts::interviewer_system_prompt;

use crate::mock_provider::{persona, personas, system_mentions, MockProvider};

/// Answers as the interviewer or the persona depending on the system prompt.
fn dialogue_provider() -> Arc<MockProvider> {
    Arc::new(MockProvider::new(|request| {
        if system_mentions(request, "User Researcher") {
            Ok("Why is that?".to_owned())
        } else {
            let answers = request
                .messages
                .iter()
                .filter(|m| m.role == Role::Assistant)
                .count();
            Ok(format!("answer {answers}"))
        }
    }))
}

#[tokio::test]
async fn max_turns_bounds_interviewer_questions() {
    for max_turns in [0_u32, 1, 3] {
        let provider = dialogue_provider();
        let engine = InterviewEngine::new(provider.gateway(), max_turns, "What do you eat?");

        let state = engine.conduct(persona("p-1", "chef")).await.expect("should finish");

        let (questions, answers) = role_counts(state.history());
        assert_eq!(questions, max_turns as usize);
        assert_eq!(answers, max_turns as usize + 1);
        assert_eq!(state.turn_count(), max_turns);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2 * max_turns + 1);
    }
}

#[tokio::test]
async fn zero_turns_is_a_single_answer() {
    let provider = dialogue_provider();
    let engine = InterviewEngine::new(provider.gateway(), 0, "Opening?");

    let state = engine.conduct(persona("p-1", "chef")).await.expect("should finish");

    assert_eq!(state.history().len(), 2);
    assert_eq!(state.history()[0].content, "Opening?");
    assert_eq!(state.history()[1].role, Role::Assistant);
    assert_eq!(state.last_content(), "answer 0");
}

#[tokio::test]
async fn roles_strictly_alternate() {
    let provider = dialogue_provider();
    let engine = InterviewEngine::new(provider.gateway(), 2, "Opening?");
    let state = engine.conduct(persona("p-1", "chef")).await.expect("should finish");

    let roles: Vec<Role> = state.history().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn interviewer_sees_only_the_latest_answer() {
    let provider = Arc::new(MockProvider::new(|request| {
        if system_mentions(request, "User Researcher") {
            assert_eq!(request.messages.len(), 2);
            assert!(request.messages[1].content.contains("first answer"));
            Ok("Tell me more.".to_owned())
        } else {
            Ok("first answer".to_owned())
        }
    }));
    let engine = InterviewEngine::new(provider.gateway(), 1, "Opening?");
    engine.conduct(persona("p-1", "chef")).await.expect("should finish");
}

#[tokio::test]
async fn single_steps_advance_the_state_machine() {
    let provider = dialogue_provider();
    let engine = InterviewEngine::new(provider.gateway(), 5, "Opening?");
    let mut state = InterviewState::new(persona("p-9", "chef"), "Opening?");

    let next = engine
        .step(&mut state, InterviewStep::Persona)
        .await
        .expect("persona step");
    assert_eq!(next, InterviewStep::Interviewer);

    let next = engine
        .step(&mut state, InterviewStep::Interviewer)
        .await
        .expect("interviewer step");
    assert_eq!(next, InterviewStep::Persona);
    assert_eq!(state.turn_count(), 1);
    assert_eq!(state.last_content(), "Why is that?");

    let done = engine.step(&mut state, InterviewStep::Done).await.expect("noop");
    assert_eq!(done, InterviewStep::Done);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_call_aborts_the_interview() {
    let provider = Arc::new(MockProvider::new(|request| {
        if system_mentions(request, "User Researcher") {
            Err(CallError::EmptyCompletion)
        } else {
            Ok("fine".to_owned())
        }
    }));
    let engine = InterviewEngine::new(provider.gateway(), 2, "Opening?");
    let err = engine.conduct(persona("p-1", "chef")).await.expect_err("should fail");
    assert!(matches!(err, CallError::EmptyCompletion));
}

#[tokio::test]
async fn run_writes_one_record_per_successful_persona() {
    let provider = Arc::new(MockProvider::new(|request| {
        if system_mentions(request, "ID: p-2") {
            Err(CallError::Parse("bad payload".to_owned()))
        } else if system_mentions(request, "User Researcher") {
            Ok("Why?".to_owned())
        } else {
            Ok("Because.".to_owned())
        }
    }));
    let engine = InterviewEngine::new(provider.gateway(), 1, "Opening?");

    let outcome = engine.run(personas(4), 2).await;

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].persona_id, "p-2");

    let record = &outcome.records[0];
    assert!(record.conversation_log.starts_with("【Initial Question】\nOpening?\n\n"));
    assert!(record.conversation_log.contains("【Interviewer Question】\nWhy?\n\n"));
    assert_eq!(record.final_answer, "Because.");
    assert_eq!(record.occupation, "clerk");
    assert_eq!(record.age, "40");
}

#[test]
fn interviewer_prompt_is_profile_independent() {
    assert!(!interviewer_system_prompt().contains("ID:"));
}
