//! Turn-bounded depth interview.
//!
//! One interview is a small state machine over [`InterviewStep`]:
//!
//! ```text
//! start ──► Persona ──(turns < max)──► Interviewer ──► Persona ...
//!              │
//!              └──(turns >= max)──► Done
//! ```
//!
//! The opening question is seeded as a user message. Every persona answer is
//! appended as an assistant message and every interviewer question as a user
//! message, so the persona always sees the dialogue from its own side. The
//! turn count advances once per interviewer question; `max_turns` therefore
//! bounds the number of follow-ups, not the number of messages.

use serde::Serialize;
use tracing::debug;

use crate::output::TableRecord;
use crate::persona::PersonaProfile;
use crate::prompts::{follow_up_request, interviewer_system_prompt, persona_system_prompt, PromptMode};
use crate::providers::{CallError, Gateway, Message, Role};

use super::batch::{run_batch, BatchOutcome};

/// Characters of the first transcript shown in the run summary.
pub const SAMPLE_LOG_CHARS: usize = 1000;

/// Where an interview goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStep {
    /// The persona answers the latest question.
    Persona,
    /// The interviewer asks one follow-up.
    Interviewer,
    /// No further calls.
    Done,
}

/// Dialogue accumulated for one persona.
///
/// History is append-only and the turn count never decreases.
#[derive(Debug, Clone)]
pub struct InterviewState {
    profile: PersonaProfile,
    history: Vec<Message>,
    turn_count: u32,
}

impl InterviewState {
    /// Seed a new interview with the opening question.
    pub fn new(profile: PersonaProfile, opening_question: impl Into<String>) -> Self {
        Self {
            profile,
            history: vec![Message::user(opening_question)],
            turn_count: 0,
        }
    }

    /// The interviewed persona.
    pub fn profile(&self) -> &PersonaProfile {
        &self.profile
    }

    /// All messages so far, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Follow-up questions asked so far.
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Content of the newest message, empty for an empty history.
    pub fn last_content(&self) -> &str {
        self.history.last().map_or("", |m| m.content.as_str())
    }

    fn append(&mut self, message: Message) {
        self.history.push(message);
    }

    fn advance_turn(&mut self) {
        self.turn_count = self.turn_count.saturating_add(1);
    }
}

/// Render a history as a labelled transcript.
///
/// Labels are positional: the first entry is the opening question, odd
/// positions are persona answers and the remaining even positions are
/// interviewer questions.
pub fn transcript(history: &[Message]) -> String {
    let mut out = String::new();
    for (index, message) in history.iter().enumerate() {
        let label = match index {
            0 => "Initial Question",
            i if i % 2 == 1 => "Persona Answer",
            _ => "Interviewer Question",
        };
        out.push('【');
        out.push_str(label);
        out.push_str("】\n");
        out.push_str(&message.content);
        out.push_str("\n\n");
    }
    out
}

/// One interview row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterviewRecord {
    /// Persona identifier.
    #[serde(rename = "ID")]
    pub id: String,
    /// Occupation.
    #[serde(rename = "Occupation")]
    pub occupation: String,
    /// Age, empty when unknown.
    #[serde(rename = "Age")]
    pub age: String,
    /// Full labelled transcript.
    #[serde(rename = "Conversation_Log")]
    pub conversation_log: String,
    /// The persona's last answer.
    #[serde(rename = "Final_Answer")]
    pub final_answer: String,
}

impl TableRecord for InterviewRecord {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Occupation",
        "Age",
        "Conversation_Log",
        "Final_Answer",
    ];
}

impl InterviewRecord {
    /// Build the row for a finished interview.
    pub fn from_state(state: &InterviewState) -> Self {
        let profile = state.profile();
        Self {
            id: profile.id.clone(),
            occupation: profile.occupation.clone(),
            age: profile.age_text(),
            conversation_log: transcript(state.history()),
            final_answer: state.last_content().to_owned(),
        }
    }
}

/// Drives interviews through the gateway.
#[derive(Debug, Clone)]
pub struct InterviewEngine {
    gateway: Gateway,
    max_turns: u32,
    opening_question: String,
}

impl InterviewEngine {
    /// Create an engine asking `opening_question` followed by at most
    /// `max_turns` follow-ups.
    pub fn new(gateway: Gateway, max_turns: u32, opening_question: impl Into<String>) -> Self {
        Self {
            gateway,
            max_turns,
            opening_question: opening_question.into(),
        }
    }

    /// Execute one step and return the next.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's [`CallError`]; `state` is left as it was
    /// before the failed call.
    pub async fn step(
        &self,
        state: &mut InterviewState,
        step: InterviewStep,
    ) -> Result<InterviewStep, CallError> {
        match step {
            InterviewStep::Persona => {
                let mut messages = Vec::with_capacity(state.history().len().saturating_add(1));
                messages.push(Message::system(persona_system_prompt(
                    state.profile(),
                    PromptMode::Detailed,
                )));
                messages.extend(state.history().iter().cloned());

                let answer = self.gateway.complete(messages).await?;
                state.append(Message::assistant(answer));

                if state.turn_count() >= self.max_turns {
                    Ok(InterviewStep::Done)
                } else {
                    Ok(InterviewStep::Interviewer)
                }
            }
            InterviewStep::Interviewer => {
                let messages = vec![
                    Message::system(interviewer_system_prompt()),
                    Message::user(follow_up_request(state.last_content())),
                ];

                let question = self.gateway.complete(messages).await?;
                state.append(Message::user(question));
                state.advance_turn();
                Ok(InterviewStep::Persona)
            }
            InterviewStep::Done => Ok(InterviewStep::Done),
        }
    }

    /// Run a full interview with one persona.
    ///
    /// # Errors
    ///
    /// Any failed call aborts the interview; no partial transcript is
    /// returned.
    pub async fn conduct(&self, profile: PersonaProfile) -> Result<InterviewState, CallError> {
        let mut state = InterviewState::new(profile, self.opening_question.clone());
        let mut step = InterviewStep::Persona;

        while step != InterviewStep::Done {
            step = self.step(&mut state, step).await?;
        }

        debug!(
            persona_id = %state.profile().id,
            turns = state.turn_count(),
            messages = state.history().len(),
            "interview finished"
        );
        Ok(state)
    }

    /// Interview every persona with at most `limit` in flight.
    pub async fn run(
        &self,
        personas: Vec<PersonaProfile>,
        limit: usize,
    ) -> BatchOutcome<InterviewRecord> {
        tracing::info!(
            personas = personas.len(),
            limit,
            max_turns = self.max_turns,
            "interviews started"
        );
        let engine = self.clone();
        run_batch(personas, limit, move |persona| {
            let engine = engine.clone();
            async move {
                let state = engine.conduct(persona).await?;
                Ok::<_, CallError>(InterviewRecord::from_state(&state))
            }
        })
        .await
    }
}

/// Counts of interviewer and persona messages in a history.
///
/// The opening question is excluded.
pub fn role_counts(history: &[Message]) -> (usize, usize) {
    history
        .iter()
        .skip(1)
        .fold((0usize, 0usize), |(questions, answers), m| match m.role {
            Role::User => (questions.saturating_add(1), answers),
            Role::Assistant => (questions, answers.saturating_add(1)),
            Role::System => (questions, answers),
        })
}

/// Summary printed after an interview run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewSummary {
    /// Interviews that produced a record.
    pub completed: usize,
    /// Personas attempted.
    pub total: usize,
    /// Start of the first record's transcript, if any.
    pub sample_log: Option<String>,
}

impl InterviewSummary {
    /// Summarize a finished batch.
    pub fn from_outcome(outcome: &BatchOutcome<InterviewRecord>) -> Self {
        Self {
            completed: outcome.records.len(),
            total: outcome.attempted(),
            sample_log: outcome
                .records
                .first()
                .map(|r| r.conversation_log.chars().take(SAMPLE_LOG_CHARS).collect()),
        }
    }
}

impl std::fmt::Display for InterviewSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Interviews completed: {}/{}", self.completed, self.total)?;
        if let Some(log) = &self.sample_log {
            writeln!(f, "--- sample conversation ---")?;
            write!(f, "{log}")?;
        }
        Ok(())
    }
}
