use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

impl Symptom {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            duration: None,
            severity: None,
            frequency: None,
        }
    }
}

/// Inbound request body for `POST /api/analyze`.
///
/// When `is_refinement` is set the transport layer guarantees that
/// `initial_analysis` is present and `followup_answers` is non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub existing_conditions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medications: Vec<String>,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_refinement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_analysis: Option<AnalysisResult>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub followup_answers: Vec<FollowupAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupAnswer {
    pub question_id: String,
    /// Question text echoed back by the client, if it kept it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub answer: String,
}

/// The fixed output schema returned by both the initial and refined paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub disclaimer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub analysis: Analysis,
    #[serde(default, deserialize_with = "lenient_records")]
    pub specialist_recommendations: Vec<SpecialistRecommendation>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub educational_resources: Vec<EducationalResource>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub emergency_warning: Option<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub followup_questions: Vec<FollowupQuestion>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_refined: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default, deserialize_with = "lenient_records")]
    pub symptom_clusters: Vec<SymptomCluster>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub potential_root_causes: Vec<RootCause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomCluster {
    #[serde(default, deserialize_with = "lenient_records")]
    pub symptoms: Vec<String>,
    pub possible_connections: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_involvement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub category: String,
    pub description: String,
    #[serde(default, deserialize_with = "lenient_records")]
    pub related_symptoms: Vec<String>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systemic_explanation: Option<String>,
}

/// Unknown values decode as `Consider`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Confidence {
    Possible,
    Likely,
    #[default]
    Consider,
}

impl From<String> for Confidence {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "possible" => Self::Possible,
            "likely" => Self::Likely,
            _ => Self::Consider,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistRecommendation {
    pub specialist_type: String,
    pub reason: String,
    #[serde(default)]
    pub priority: Priority,
    pub what_they_treat: String,
}

impl SpecialistRecommendation {
    /// Generic practitioners the prompt forbids recommending
    pub const GENERIC_PRACTITIONERS: [&'static str; 3] = [
        "Primary Care Physician",
        "General Practitioner",
        "Family Doctor",
    ];

    pub fn is_generic_practitioner(&self) -> bool {
        let specialist = self.specialist_type.trim();
        Self::GENERIC_PRACTITIONERS
            .iter()
            .any(|generic| specialist.eq_ignore_ascii_case(generic))
    }
}

/// Unknown values decode as `Consider`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    Primary,
    Secondary,
    #[default]
    Consider,
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            _ => Self::Consider,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationalResource {
    pub title: String,
    pub source: String,
    pub relevance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub context: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[serde(alias = "Text")]
    Text,
    #[serde(alias = "Select")]
    Select,
}

/// The part of an analysis the model is asked to fill in.
///
/// Only the top-level shape is strict. Nested records that do not decode are
/// dropped one by one so a single bad entry does not discard the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub analysis: Analysis,
    #[serde(default, deserialize_with = "lenient_records")]
    pub specialist_recommendations: Vec<SpecialistRecommendation>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub educational_resources: Vec<EducationalResource>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub next_steps: Vec<String>,
}

/// `null` decodes as the default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A list whose undecodable entries are skipped; `null` is an empty list
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(
                    record = std::any::type_name::<T>(),
                    error = %e,
                    "Dropping undecodable record"
                );
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults_optional_fields() {
        let request: AnalysisRequest = serde_json::from_value(json!({
            "symptoms": [{ "description": "Persistent fatigue and weakness" }]
        }))
        .unwrap();

        assert_eq!(request.symptoms.len(), 1);
        assert!(!request.is_refinement);
        assert!(request.existing_conditions.is_empty());
        assert!(request.initial_analysis.is_none());
        assert!(request.followup_answers.is_empty());
    }

    #[test]
    fn test_request_treats_null_as_absent() {
        let request: AnalysisRequest = serde_json::from_value(json!({
            "symptoms": [{ "description": "Persistent fatigue and weakness" }],
            "age_range": null,
            "existing_conditions": null,
            "medications": null,
            "additional_context": null,
            "is_refinement": null,
            "initial_analysis": null,
            "followup_answers": null
        }))
        .unwrap();

        assert!(request.age_range.is_none());
        assert!(request.existing_conditions.is_empty());
        assert!(request.medications.is_empty());
        assert!(!request.is_refinement);
        assert!(request.followup_answers.is_empty());
    }

    #[test]
    fn test_unknown_enum_values_become_consider() {
        let cause: RootCause = serde_json::from_value(json!({
            "category": "Endocrine",
            "description": "Thyroid function could be related",
            "confidence": "high"
        }))
        .unwrap();
        assert_eq!(cause.confidence, Confidence::Consider);

        let cause: RootCause = serde_json::from_value(json!({
            "category": "Endocrine",
            "description": "Thyroid function could be related",
            "confidence": "Likely"
        }))
        .unwrap();
        assert_eq!(cause.confidence, Confidence::Likely);
        assert_eq!(serde_json::to_value(cause.confidence).unwrap(), "likely");

        let rec: SpecialistRecommendation = serde_json::from_value(json!({
            "specialist_type": "Endocrinologist",
            "reason": "r",
            "priority": "urgent",
            "what_they_treat": "w"
        }))
        .unwrap();
        assert_eq!(rec.priority, Priority::Consider);
    }

    #[test]
    fn test_payload_drops_undecodable_records() {
        let payload: AnalysisPayload = serde_json::from_value(json!({
            "analysis": {
                "symptom_clusters": [
                    { "symptoms": ["fatigue"] },
                    { "symptoms": ["fatigue", "weight gain"], "possible_connections": "metabolism" }
                ],
                "potential_root_causes": [
                    { "category": "Endocrine", "description": "d", "confidence": 7 },
                    { "category": "Nutritional", "description": "d", "confidence": "possible" }
                ]
            },
            "specialist_recommendations": [
                { "specialist_type": "Endocrinologist" },
                {
                    "specialist_type": "Hematologist",
                    "reason": "r",
                    "priority": "secondary",
                    "what_they_treat": "w"
                }
            ],
            "educational_resources": null,
            "next_steps": ["Keep a diary", 3]
        }))
        .unwrap();

        assert_eq!(payload.analysis.symptom_clusters.len(), 1);
        assert_eq!(payload.analysis.potential_root_causes[0].category, "Nutritional");
        assert_eq!(payload.analysis.potential_root_causes.len(), 1);
        assert_eq!(payload.specialist_recommendations.len(), 1);
        assert_eq!(payload.specialist_recommendations[0].specialist_type, "Hematologist");
        assert!(payload.educational_resources.is_empty());
        assert_eq!(payload.next_steps, vec!["Keep a diary"]);
    }

    #[test]
    fn test_question_kind_uses_type_key() {
        let question: FollowupQuestion = serde_json::from_value(json!({
            "id": "q2",
            "question": "When do the headaches start?",
            "type": "Select",
            "context": "Timing separates triggers",
            "options": ["Morning", "Evening"]
        }))
        .unwrap();
        assert_eq!(question.kind, QuestionKind::Select);

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["type"], "select");
    }

    #[test]
    fn test_result_serializes_null_warning_and_omits_absent_error() {
        let result = AnalysisResult {
            disclaimer: "d".to_string(),
            analysis: Analysis::default(),
            specialist_recommendations: vec![],
            educational_resources: vec![],
            next_steps: vec![],
            emergency_warning: None,
            followup_questions: vec![],
            is_refined: false,
            error: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["emergency_warning"].is_null());
        assert!(value.get("error").is_none());
        assert!(value["analysis"].get("refinement_summary").is_none());
    }

    #[test]
    fn test_generic_practitioner_check_ignores_case() {
        let rec = SpecialistRecommendation {
            specialist_type: " family doctor ".to_string(),
            reason: String::new(),
            priority: Priority::Primary,
            what_they_treat: String::new(),
        };
        assert!(rec.is_generic_practitioner());
    }
}
