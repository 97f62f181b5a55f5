//! Structural checks on the raw request body, run before it is decoded.
//!
//! The analysis pipeline assumes these hold and never re-checks them.

use serde_json::Value;
use thiserror::Error;

pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// A rejected request. `Display` is the message returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid JSON payload")]
    InvalidJson,
    #[error("Missing required field: 'symptoms'")]
    MissingSymptoms,
    #[error("'symptoms' must be an array")]
    SymptomsNotArray,
    #[error("At least one symptom is required")]
    NoSymptoms,
    #[error("Symptom {0} must be an object")]
    SymptomNotObject(usize),
    #[error("Symptom {0} missing required field: 'description'")]
    MissingDescription(usize),
    #[error("Symptom {0} description must be a string")]
    DescriptionNotString(usize),
    #[error("Symptom {0} description too short (minimum 10 characters)")]
    DescriptionTooShort(usize),
    #[error("Symptom {0} description too long (maximum 500 characters)")]
    DescriptionTooLong(usize),
    #[error("Refinement mode requires 'initial_analysis' field")]
    MissingInitialAnalysis,
    #[error("Refinement mode requires 'followup_answers' field")]
    MissingFollowupAnswers,
    #[error("'followup_answers' must be an array")]
    FollowupAnswersNotArray,
    #[error("At least one follow-up answer is required for refinement")]
    NoFollowupAnswers,
    #[error("Follow-up answer {0} must be an object")]
    AnswerNotObject(usize),
    #[error("Follow-up answer {0} must have 'question_id' and 'answer' fields")]
    AnswerMissingFields(usize),
    #[error("Follow-up answer {0} 'answer' must be a string")]
    AnswerNotString(usize),
    #[error("Follow-up answer {0} cannot be empty")]
    EmptyAnswer(usize),
    /// Structurally valid but not decodable into a request
    #[error("Invalid request: {0}")]
    Malformed(String),
}

/// Check the request body. Positions in messages are 1-based.
pub fn validate_payload(payload: &Value) -> Result<(), ValidationError> {
    let object = payload.as_object().ok_or(ValidationError::InvalidJson)?;
    if object.is_empty() {
        return Err(ValidationError::InvalidJson);
    }

    let symptoms = object
        .get("symptoms")
        .ok_or(ValidationError::MissingSymptoms)?
        .as_array()
        .ok_or(ValidationError::SymptomsNotArray)?;
    if symptoms.is_empty() {
        return Err(ValidationError::NoSymptoms);
    }
    for (i, symptom) in symptoms.iter().enumerate() {
        validate_symptom(i + 1, symptom)?;
    }

    let is_refinement = object
        .get("is_refinement")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if is_refinement {
        validate_refinement(object)?;
    }
    Ok(())
}

fn validate_symptom(n: usize, symptom: &Value) -> Result<(), ValidationError> {
    let symptom = symptom
        .as_object()
        .ok_or(ValidationError::SymptomNotObject(n))?;
    let description = symptom
        .get("description")
        .ok_or(ValidationError::MissingDescription(n))?
        .as_str()
        .ok_or(ValidationError::DescriptionNotString(n))?;

    match description.chars().count() {
        len if len < MIN_DESCRIPTION_CHARS => Err(ValidationError::DescriptionTooShort(n)),
        len if len > MAX_DESCRIPTION_CHARS => Err(ValidationError::DescriptionTooLong(n)),
        _ => Ok(()),
    }
}

fn validate_refinement(object: &serde_json::Map<String, Value>) -> Result<(), ValidationError> {
    match object.get("initial_analysis") {
        None | Some(Value::Null) => return Err(ValidationError::MissingInitialAnalysis),
        Some(_) => {}
    }

    let answers = object
        .get("followup_answers")
        .ok_or(ValidationError::MissingFollowupAnswers)?
        .as_array()
        .ok_or(ValidationError::FollowupAnswersNotArray)?;
    if answers.is_empty() {
        return Err(ValidationError::NoFollowupAnswers);
    }

    for (i, answer) in answers.iter().enumerate() {
        let n = i + 1;
        let answer = answer.as_object().ok_or(ValidationError::AnswerNotObject(n))?;
        if !answer.contains_key("question_id") || !answer.contains_key("answer") {
            return Err(ValidationError::AnswerMissingFields(n));
        }
        let text = answer
            .get("answer")
            .and_then(Value::as_str)
            .ok_or(ValidationError::AnswerNotString(n))?;
        if text.is_empty() {
            return Err(ValidationError::EmptyAnswer(n));
        }
    }
    Ok(())
}
