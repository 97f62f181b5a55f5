//! Keyword screen for symptoms that need an emergency room, not a specialist.
//!
//! Matching is a plain lower-cased substring test; there is no stemming or
//! fuzzy matching, so the phrases below are matched exactly as written.

use crate::models::Symptom;

pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "chest pain",
    "chest pressure",
    "heart attack",
    "difficulty breathing",
    "can't breathe",
    "shortness of breath",
    "severe headache",
    "worst headache",
    "severe bleeding",
    "bleeding won't stop",
    "loss of consciousness",
    "passed out",
    "fainted",
    "confusion",
    "disoriented",
    "altered mental",
    "stroke",
    "face drooping",
    "arm weakness",
    "speech difficulty",
    "severe allergic",
    "anaphylaxis",
    "throat swelling",
    "suicidal",
    "self-harm",
    "want to die",
    "severe abdominal pain",
    "severe stomach pain",
    "coughing blood",
    "coughing up blood",
    "seizure",
    "convulsion",
    "severe burn",
    "poisoning",
    "overdose",
];

/// True when any symptom description contains an emergency phrase
pub fn detect_emergency(symptoms: &[Symptom]) -> bool {
    matched_keyword(symptoms).is_some()
}

/// First emergency phrase found, scanning symptoms in order
pub fn matched_keyword(symptoms: &[Symptom]) -> Option<&'static str> {
    symptoms.iter().find_map(|symptom| {
        let description = symptom.description.to_lowercase();
        EMERGENCY_KEYWORDS
            .iter()
            .copied()
            .find(|keyword| description.contains(keyword))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_keyword_case_insensitively() {
        let symptoms = vec![
            Symptom::new("Mild rash on my forearm for a week"),
            Symptom::new("Severe CHEST PAIN that won't go away"),
        ];
        assert!(detect_emergency(&symptoms));
        assert_eq!(matched_keyword(&symptoms), Some("chest pain"));
    }

    #[test]
    fn test_ignores_non_emergency_symptoms() {
        let symptoms = vec![
            Symptom::new("Persistent fatigue and weakness"),
            Symptom::new("Unexplained weight gain over two months"),
        ];
        assert!(!detect_emergency(&symptoms));
    }

    #[test]
    fn test_requires_exact_phrase() {
        // "breathing" alone is not an emergency phrase
        let symptoms = vec![Symptom::new("Noisy breathing when I sleep at night")];
        assert!(!detect_emergency(&symptoms));

        let symptoms = vec![Symptom::new("I can't breathe when lying down")];
        assert!(detect_emergency(&symptoms));
    }

    #[test]
    fn test_empty_symptom_list() {
        assert!(!detect_emergency(&[]));
    }
}
