//! Fixed response bodies that never involve the model, plus the assembly of
//! a full [`AnalysisResult`] from a decoded model payload.

use crate::models::{
    Analysis, AnalysisPayload, AnalysisResult, Priority, SpecialistRecommendation,
};

pub const DISCLAIMER: &str = "⚠️ MEDICAL DISCLAIMER
This tool provides educational information only and is not a substitute for professional medical advice, diagnosis, or treatment. Always seek the advice of your physician or other qualified health provider with any questions you may have regarding a medical condition. Never disregard professional medical advice or delay in seeking it because of something you have read on this site.

If you think you may have a medical emergency, call 911 or go to the nearest emergency room immediately.";

pub const EMERGENCY_WARNING: &str = "🚨 SEEK IMMEDIATE MEDICAL ATTENTION 🚨\n\nCall 911 or go to the nearest emergency room immediately. These symptoms may indicate a medical emergency.";

pub const EMERGENCY_REFINEMENT_SUMMARY: &str =
    "Emergency symptoms detected - immediate medical attention required";

pub const TECHNICAL_DIFFICULTIES: &str =
    "We are experiencing technical difficulties. Please try again or consult a medical professional.";

pub const REFINEMENT_FAILED: &str = "Refinement failed. Showing original analysis.";

/// Emergency-room referral. `refined` marks it as the answer to a
/// refinement request.
pub fn emergency_result(refined: bool) -> AnalysisResult {
    AnalysisResult {
        disclaimer: DISCLAIMER.to_string(),
        analysis: Analysis {
            refinement_summary: refined.then(|| EMERGENCY_REFINEMENT_SUMMARY.to_string()),
            ..Analysis::default()
        },
        specialist_recommendations: vec![SpecialistRecommendation {
            specialist_type: "Emergency Room".to_string(),
            reason: "Your symptoms may indicate a medical emergency requiring immediate attention"
                .to_string(),
            priority: Priority::Primary,
            what_they_treat: "Life-threatening and urgent medical conditions".to_string(),
        }],
        educational_resources: Vec::new(),
        next_steps: strings(&[
            "Call 911 immediately",
            "Go to the nearest emergency room",
            "Do not drive yourself - call an ambulance if needed",
        ]),
        emergency_warning: Some(EMERGENCY_WARNING.to_string()),
        followup_questions: Vec::new(),
        is_refined: refined,
        error: None,
    }
}

/// Safe generic answer used when the initial analysis cannot be produced
pub fn fallback_result() -> AnalysisResult {
    AnalysisResult {
        disclaimer: DISCLAIMER.to_string(),
        analysis: Analysis::default(),
        specialist_recommendations: vec![SpecialistRecommendation {
            specialist_type: "Internal Medicine Specialist".to_string(),
            reason: "An internal medicine specialist can evaluate complex symptom patterns and coordinate care across multiple systems".to_string(),
            priority: Priority::Primary,
            what_they_treat: "Complex multi-system conditions requiring comprehensive evaluation"
                .to_string(),
        }],
        educational_resources: Vec::new(),
        next_steps: strings(&[
            "Schedule an appointment with an internal medicine specialist or appropriate healthcare provider",
            "Keep a detailed symptom diary noting patterns and triggers",
            "Note any changes in symptoms or connections between them",
        ]),
        emergency_warning: None,
        followup_questions: Vec::new(),
        is_refined: false,
        error: Some(TECHNICAL_DIFFICULTIES.to_string()),
    }
}

/// The prior analysis returned unchanged apart from the error flag
pub fn refinement_failed(prior: &AnalysisResult) -> AnalysisResult {
    AnalysisResult {
        error: Some(REFINEMENT_FAILED.to_string()),
        is_refined: false,
        followup_questions: Vec::new(),
        ..prior.clone()
    }
}

impl AnalysisResult {
    pub fn from_payload(payload: AnalysisPayload, is_refined: bool) -> Self {
        Self {
            disclaimer: DISCLAIMER.to_string(),
            analysis: payload.analysis,
            specialist_recommendations: payload.specialist_recommendations,
            educational_resources: payload.educational_resources,
            next_steps: payload.next_steps,
            emergency_warning: None,
            followup_questions: Vec::new(),
            is_refined,
            error: None,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
