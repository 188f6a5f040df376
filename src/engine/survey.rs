//! Single-question survey.

use serde::Serialize;

use crate::output::{snippet, TableRecord};
use crate::persona::PersonaProfile;
use crate::prompts::{persona_system_prompt, PromptMode};
use crate::providers::{CallError, Gateway, Message};

use super::batch::{run_sequential, BatchOutcome};

/// Characters of the personality text kept in `Context_Summary`.
const CONTEXT_SNIPPET_CHARS: usize = 30;

/// One survey row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyRecord {
    /// Persona identifier.
    #[serde(rename = "ID")]
    pub id: String,
    /// Age, empty when unknown.
    #[serde(rename = "Age")]
    pub age: String,
    /// Sex.
    #[serde(rename = "Sex")]
    pub sex: String,
    /// Occupation.
    #[serde(rename = "Occupation")]
    pub occupation: String,
    /// Prefecture.
    #[serde(rename = "Prefecture")]
    pub prefecture: String,
    /// Start of the personality text.
    #[serde(rename = "Context_Summary")]
    pub context_summary: String,
    /// The completion, verbatim.
    #[serde(rename = "Survey_Answer")]
    pub answer: String,
}

impl TableRecord for SurveyRecord {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Age",
        "Sex",
        "Occupation",
        "Prefecture",
        "Context_Summary",
        "Survey_Answer",
    ];
}

/// Asks every persona the same question.
#[derive(Debug, Clone)]
pub struct SurveyEngine {
    gateway: Gateway,
    question: String,
}

impl SurveyEngine {
    /// Create an engine asking `question`.
    pub fn new(gateway: Gateway, question: impl Into<String>) -> Self {
        Self {
            gateway,
            question: question.into(),
        }
    }

    /// Ask one persona.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's [`CallError`].
    pub async fn ask(&self, persona: &PersonaProfile) -> Result<SurveyRecord, CallError> {
        let messages = vec![
            Message::system(persona_system_prompt(persona, PromptMode::Detailed)),
            Message::user(self.question.clone()),
        ];
        let answer = self.gateway.complete(messages).await?;

        Ok(SurveyRecord {
            id: persona.id.clone(),
            age: persona.age_text(),
            sex: persona.sex.clone(),
            occupation: persona.occupation.clone(),
            prefecture: persona.prefecture.clone(),
            context_summary: snippet(&persona.personality, CONTEXT_SNIPPET_CHARS),
            answer,
        })
    }

    /// Ask every persona in order, one call at a time.
    pub async fn run(&self, personas: Vec<PersonaProfile>) -> BatchOutcome<SurveyRecord> {
        tracing::info!(personas = personas.len(), "survey started");
        run_sequential(personas, |persona| async move { self.ask(&persona).await }).await
    }
}
