//! System prompt templates.
//!
//! Everything here is a pure function of its inputs. Missing persona fields
//! render as empty text.

use crate::persona::PersonaProfile;

/// How much of a profile goes into the persona system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Age, sex, occupation, personality and hobbies. Used for quick,
    /// single-judgment tasks such as ad copy evaluation.
    Simple,
    /// The simple fields plus identifier, residence, professional stance and
    /// cultural background. Used where the model must stay in character for
    /// longer (survey answers, interviews).
    Detailed,
}

/// Build the persona system prompt for the given mode.
pub fn persona_system_prompt(profile: &PersonaProfile, mode: PromptMode) -> String {
    match mode {
        PromptMode::Simple => simple_prompt(profile),
        PromptMode::Detailed => detailed_prompt(profile),
    }
}

fn simple_prompt(profile: &PersonaProfile) -> String {
    format!(
        "You are a real Japanese person with the following profile.\n\
         \n\
         - Age: {age} / Sex: {sex}\n\
         - Occupation: {occupation}\n\
         - Personality/Values: {personality}\n\
         - Hobbies/Interests: {hobbies}\n\
         \n\
         Please answer intuitively and based on your daily life context, acting as this person.\n",
        age = profile.age_text(),
        sex = profile.sex,
        occupation = profile.occupation,
        personality = profile.personality,
        hobbies = profile.hobbies_and_interests,
    )
}

fn detailed_prompt(profile: &PersonaProfile) -> String {
    format!(
        "You are a real Japanese person with the following profile.\n\
         \n\
         ## Your Profile\n\
         - ID: {id}\n\
         - Age: {age} / Sex: {sex}\n\
         - Residence: {prefecture} ({region})\n\
         - Occupation: {occupation}\n\
         \n\
         ## Detailed Persona & Values\n\
         - Personality: {personality}\n\
         - Professional Stance: {professional}\n\
         - Hobbies: {hobbies}\n\
         - Cultural Background: {background}\n\
         \n\
         You are the respondent. You are not an AI: answer in the first person, naturally, \
         as this person would.\n\
         Speak your honest feelings and concerns based on the reality of your daily life, \
         not shallow polite answers.\n",
        id = profile.id,
        age = profile.age_text(),
        sex = profile.sex,
        prefecture = profile.prefecture,
        region = profile.region,
        occupation = profile.occupation,
        personality = profile.personality,
        professional = profile.professional_persona,
        hobbies = profile.hobbies_and_interests,
        background = profile.cultural_background,
    )
}

/// System prompt for the interviewer role. Carries no persona data.
pub fn interviewer_system_prompt() -> &'static str {
    "You are an expert User Researcher.\n\
     Your job is to dig deeper into the respondent's answers by asking \"Why?\" \
     or asking for \"Specific scenes\".\n\
     \n\
     Rules:\n\
     1. Focus on \"ambiguous points\" or \"emotional points\" in the answer.\n\
     2. Keep questions short and piercing. Ask exactly one question.\n\
     3. Never state your own opinion; strictly ask questions.\n"
}

/// User message asking the interviewer for one follow-up question.
pub fn follow_up_request(last_answer: &str) -> String {
    format!("Respondent's Answer: {last_answer}\n\nCreate ONE deep-dive question for this.")
}

/// User message asking a persona to score one piece of ad copy.
pub fn evaluation_request(ad_copy: &str) -> String {
    format!(
        "Please look at the following ad copy, rate it out of 10, and state your reason in one sentence.\n\
         \n\
         {ad_copy}\n\
         \n\
         Answer Format:\n\
         Score: (Number only)\n\
         Impression: (Impression)\n"
    )
}

/// User message asking a persona to choose between two evaluated plans.
pub fn decision_request(eval_a: &str, eval_b: &str) -> String {
    format!(
        "You have evaluated two plans.\n\
         \n\
         【Your Evaluation of Plan A】\n\
         {eval_a}\n\
         \n\
         【Your Evaluation of Plan B】\n\
         {eval_b}\n\
         \n\
         Ultimately, which one do you find more attractive and want to purchase for your lifestyle and occupation?\n\
         Please answer clearly with \"A\" or \"B\" and state the decisive reason.\n\
         \n\
         Answer Format:\n\
         Winner: (A or B)\n\
         Reason: (Reason text)\n"
    )
}
