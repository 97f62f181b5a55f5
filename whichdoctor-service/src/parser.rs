//! Extraction of the JSON object embedded in a raw model reply.
//!
//! Models wrap their JSON in markdown fences or surround it with prose, so the
//! object is located by its outermost braces before being deserialized.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::{AnalysisPayload, FollowupQuestion};

pub const ANALYSIS_REQUIRED_KEYS: &[&str] = &[
    "analysis",
    "specialist_recommendations",
    "educational_resources",
    "next_steps",
];

pub const FOLLOWUP_REQUIRED_KEYS: &[&str] = &["questions"];

/// Upper bound on follow-up questions kept from one reply
pub const MAX_FOLLOWUP_QUESTIONS: usize = 5;

/// Characters of surrounding text reported on either side of a JSON error
const ERROR_CONTEXT_CHARS: usize = 100;

const FOLLOWUP_QUESTION_FIELDS: [&str; 4] = ["id", "question", "type", "context"];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No JSON object found in response: {preview:?}")]
    NoJsonObject { preview: String },

    #[error("Invalid JSON at line {line}, column {column} (offset {offset}): {message}; near {context:?}")]
    InvalidJson {
        line: usize,
        column: usize,
        offset: usize,
        message: String,
        context: String,
    },

    #[error("Response missing required fields: {0:?}")]
    MissingKeys(Vec<String>),

    #[error("Response does not match the expected schema: {0}")]
    Schema(String),

    #[error("No valid follow-up questions in response")]
    NoValidQuestions,
}

/// Extract the JSON object from `raw` and check that `required_keys` are all
/// present at its top level.
pub fn parse_response(raw: &str, required_keys: &[&str]) -> Result<Map<String, Value>, ParseError> {
    let json_text = extract_json_object(raw)?;

    let object: Map<String, Value> = serde_json::from_str(json_text).map_err(|e| {
        let offset = byte_offset(json_text, e.line(), e.column());
        debug!(
            line = e.line(),
            column = e.column(),
            length = json_text.len(),
            "Model response is not valid JSON"
        );
        ParseError::InvalidJson {
            line: e.line(),
            column: e.column(),
            offset,
            message: e.to_string(),
            context: context_around(json_text, offset),
        }
    })?;

    let missing: Vec<String> = required_keys
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingKeys(missing));
    }

    Ok(object)
}

/// Parse a main-analysis reply into its typed payload
pub fn decode_analysis(raw: &str) -> Result<AnalysisPayload, ParseError> {
    let object = parse_response(raw, ANALYSIS_REQUIRED_KEYS)?;
    serde_json::from_value(Value::Object(object)).map_err(|e| ParseError::Schema(e.to_string()))
}

/// Parse a follow-up reply: keep the first five questions, drop any that are
/// missing a required field or do not decode, and fail if none survive.
pub fn decode_followup_questions(raw: &str) -> Result<Vec<FollowupQuestion>, ParseError> {
    let mut object = parse_response(raw, FOLLOWUP_REQUIRED_KEYS)?;

    let Some(Value::Array(questions)) = object.remove("questions") else {
        return Err(ParseError::Schema("'questions' must be a list".to_string()));
    };

    let valid: Vec<FollowupQuestion> = questions
        .into_iter()
        .take(MAX_FOLLOWUP_QUESTIONS)
        .filter(|q| FOLLOWUP_QUESTION_FIELDS.iter().all(|field| q.get(*field).is_some()))
        .filter_map(|q| match serde_json::from_value::<FollowupQuestion>(q) {
            Ok(question) => Some(question),
            Err(e) => {
                debug!(error = %e, "Dropping malformed follow-up question");
                None
            }
        })
        .collect();

    if valid.is_empty() {
        return Err(ParseError::NoValidQuestions);
    }
    Ok(valid)
}

fn extract_json_object(raw: &str) -> Result<&str, ParseError> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    let text = text.trim();

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start <= end => Ok(&text[start..=end]),
        _ => Err(ParseError::NoJsonObject {
            preview: text.chars().take(ERROR_CONTEXT_CHARS).collect(),
        }),
    }
}

/// Byte offset of a 1-based line/column position reported by serde_json
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

fn context_around(text: &str, offset: usize) -> String {
    let mut start = offset.saturating_sub(ERROR_CONTEXT_CHARS);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (offset + ERROR_CONTEXT_CHARS).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    text[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionKind;
    use crate::test_support::{ANALYSIS_JSON, FOLLOWUP_JSON};
    use serde_json::json;

    #[test]
    fn test_extracts_fenced_object_with_prose() {
        let raw = format!(
            "Here is the analysis you asked for:\n```json\n{ANALYSIS_JSON}\n```\nLet me know if you need more."
        );
        // The fence is not at the very start, so the braces do the work.
        let parsed = parse_response(&raw, ANALYSIS_REQUIRED_KEYS).unwrap();
        let expected: Value = serde_json::from_str(ANALYSIS_JSON).unwrap();
        assert_eq!(Value::Object(parsed), expected);
    }

    #[test]
    fn test_strips_leading_fence() {
        let raw = format!("```json\n{ANALYSIS_JSON}\n```");
        let payload = decode_analysis(&raw).unwrap();
        assert_eq!(payload.specialist_recommendations[0].specialist_type, "Endocrinologist");
        assert_eq!(payload.next_steps.len(), 2);
    }

    #[test]
    fn test_rejects_text_without_object() {
        let err = parse_response("I cannot help with that.", ANALYSIS_REQUIRED_KEYS).unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject { .. }));

        let err = parse_response("} backwards {", ANALYSIS_REQUIRED_KEYS).unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject { .. }));
    }

    #[test]
    fn test_reports_position_of_invalid_json() {
        let raw = "{\n  \"analysis\": {},\n  \"next_steps\": [\"a\" \"b\"]\n}";
        let err = parse_response(raw, ANALYSIS_REQUIRED_KEYS).unwrap_err();
        match err {
            ParseError::InvalidJson {
                line,
                offset,
                context,
                ..
            } => {
                assert_eq!(line, 3);
                assert!(offset > 0 && offset < raw.len());
                assert!(context.contains("next_steps"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_names_missing_keys() {
        let raw = r#"{"analysis": {}, "next_steps": []}"#;
        let err = parse_response(raw, ANALYSIS_REQUIRED_KEYS).unwrap_err();
        match err {
            ParseError::MissingKeys(keys) => {
                assert_eq!(keys, vec!["specialist_recommendations", "educational_resources"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_concatenated_objects() {
        let err = parse_response("{\"a\": 1} and {\"b\": 2}", &[]).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_analysis_schema_mismatch() {
        let raw = json!({
            "analysis": "Symptoms suggest a thyroid issue",
            "specialist_recommendations": [],
            "educational_resources": [],
            "next_steps": []
        })
        .to_string();
        assert!(matches!(decode_analysis(&raw), Err(ParseError::Schema(_))));
    }

    #[test]
    fn test_analysis_keeps_payload_with_one_bad_record() {
        let raw = ANALYSIS_JSON.replace(r#""confidence": "possible""#, r#""confidence": "high""#);
        let payload = decode_analysis(&raw).unwrap();
        assert_eq!(payload.analysis.potential_root_causes.len(), 1);
        assert_eq!(payload.specialist_recommendations.len(), 2);
    }

    #[test]
    fn test_followup_questions_are_decoded() {
        let questions = decode_followup_questions(FOLLOWUP_JSON).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].kind, QuestionKind::Select);
        assert_eq!(questions[1].options.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_followup_questions_truncated_and_filtered() {
        let mut questions: Vec<Value> = (1..=7)
            .map(|i| {
                json!({
                    "id": format!("q{i}"),
                    "question": format!("Question {i}?"),
                    "type": "text",
                    "context": "why",
                    "options": null
                })
            })
            .collect();
        // missing context, then an unknown type
        questions[1] = json!({ "id": "q2", "question": "No context?", "type": "text" });
        questions[3]["type"] = json!("slider");

        let raw = json!({ "questions": questions }).to_string();
        let decoded = decode_followup_questions(&raw).unwrap();
        let ids: Vec<&str> = decoded.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q3", "q5"]);
    }

    #[test]
    fn test_followup_without_valid_questions_fails() {
        let raw = r#"{"questions": [{"id": "q1"}]}"#;
        assert!(matches!(
            decode_followup_questions(raw),
            Err(ParseError::NoValidQuestions)
        ));

        let raw = r#"{"questions": "none"}"#;
        assert!(matches!(decode_followup_questions(raw), Err(ParseError::Schema(_))));
    }
}
