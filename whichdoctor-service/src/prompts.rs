//! Prompt construction for the three model round-trips.
//!
//! The wording here is the main steering mechanism for both safety (no
//! diagnosis, no generic practitioners) and quality (cross-system reasoning),
//! so changes to it change the behaviour of the service. Every builder is a
//! pure function of its inputs: identical input gives byte-identical output.

use crate::models::{AnalysisRequest, AnalysisResult, FollowupAnswer, Symptom};

const NOT_SPECIFIED: &str = "Not specified";

/// Maximum prior specialists / root causes echoed into follow-up prompts
const PRIOR_CONTEXT_LIMIT: usize = 3;

const CRITICAL_RULES: &str = r#"CRITICAL RULES:
- Never diagnose conditions
- Never provide medical advice or treatment recommendations
- Only suggest appropriate specialist types who can address interconnected issues
- Use advisory language: "may indicate", "consider", "could be related to"
- Never use diagnostic language: "you have", "diagnosed with", "you need"
- Provide 1-3 specialist recommendations maximum
- DO NOT recommend "Primary Care Physician", "General Practitioner" or "Family Doctor" - they often don't know which specialist to refer to
- ONLY recommend specific specialists who have expertise in the interconnected patterns you identify
- Include educational context from credible sources"#;

const HOLISTIC_FRAMEWORK: &str = r#"HOLISTIC ANALYSIS FRAMEWORK:
You are analyzing symptoms from a systems medicine perspective. The human body is an interconnected system where issues in one area can manifest as symptoms in seemingly unrelated areas.

When analyzing symptoms, actively look for:
- Cross-system connections (e.g., hormonal issues affecting multiple body systems)
- Cascade effects (e.g., nutritional deficiencies causing widespread symptoms)
- Bidirectional relationships (e.g., gut-brain axis, immune-endocrine interactions)
- Root cause patterns that explain multiple symptoms together

Common holistic patterns to consider:
- Endocrine/Hormonal: Thyroid, adrenal, reproductive hormones affecting energy, weight, mood, temperature, digestion
- Autoimmune: Inflammation affecting multiple organ systems simultaneously
- Nutritional: Vitamin/mineral deficiencies causing diverse symptoms (fatigue, neurological, skin, immune)
- Metabolic: Blood sugar dysregulation, insulin resistance affecting multiple systems
- Inflammatory: Chronic inflammation manifesting in various body systems
- Gut-related: Microbiome imbalances affecting digestion, mood, immunity, skin
- Stress/HPA axis: Chronic stress affecting hormones, immunity, digestion, sleep

EXAMPLES OF HOLISTIC CONNECTIONS:
- Fatigue + weight gain + cold sensitivity + constipation → May indicate thyroid dysfunction affecting metabolism across multiple systems
- Joint pain + fatigue + brain fog + digestive issues → Could suggest autoimmune process or systemic inflammation
- Fatigue + tingling + mood changes + pale skin → Might point to B12 deficiency affecting nervous, blood, and energy systems
- Headaches + fatigue + digestive issues + anxiety → Consider gut-brain axis involvement

When you identify such patterns, explain the interconnections and recommend specialists who treat the ROOT system, not just individual symptoms."#;

const ANALYSIS_SCHEMA: &str = r#"{
  "analysis": {
    "symptom_clusters": [
      {
        "symptoms": ["symptom1", "symptom2"],
        "possible_connections": "Educational explanation emphasizing HOW and WHY these symptoms connect across body systems",
        "system_involvement": "Which body systems are involved (e.g., 'Endocrine and Metabolic', 'Immune and Digestive')"
      }
    ],
    "potential_root_causes": [
      {
        "category": "Specific medical category (e.g., 'Endocrine - Thyroid', 'Autoimmune - Systemic', 'Nutritional - B12 Deficiency')",
        "description": "Educational explanation of how this root cause creates a cascade of symptoms across body systems",
        "related_symptoms": ["symptom1", "symptom2"],
        "confidence": "possible|likely|consider",
        "systemic_explanation": "Brief explanation of the systemic/holistic connection"
      }
    ]
  },
  "specialist_recommendations": [
    {
      "specialist_type": "Specific specialist type (e.g., 'Endocrinologist', 'Rheumatologist')",
      "reason": "Why this specialist is relevant to these symptoms",
      "priority": "primary|secondary|consider",
      "what_they_treat": "Brief explanation of what this specialist treats"
    }
  ],
  "educational_resources": [
    {
      "title": "Resource title",
      "source": "Credible source (e.g., 'NIH', 'Mayo Clinic', 'MedlinePlus')",
      "relevance": "Why this resource is helpful for these symptoms"
    }
  ],
  "next_steps": [
    "Actionable advice like 'Schedule appointment with recommended specialist'",
    "Keep a symptom diary to share with your doctor"
  ]
}"#;

const FOLLOWUP_FOCUS: &str = r#"HOLISTIC ANALYSIS FOCUS:
Generate questions that help identify:
- Patterns across body systems
- Timeline of symptom development (what appeared first, what followed)
- Triggers and relieving factors (stress, diet, sleep, hormonal cycles)
- Related symptoms the user might not have connected (fatigue, digestion, mood, sleep, skin, temperature sensitivity)

TASK:
Generate 3-5 clarifying questions that will help:
1. Distinguish between similar conditions
2. Identify red flags or urgent symptoms
3. Understand symptom progression and patterns
4. Gather contextual information about triggers or alleviating factors

RULES:
- Questions must help identify root causes and systemic patterns
- Focus on symptoms, timing, patterns, triggers, diet, stress, sleep, hormonal factors
- Ask about seemingly unrelated symptoms that could reveal systemic connections
- Avoid asking for self-diagnosis
- Use plain language (no medical jargon)
- Each question should help narrow down the specialist recommendation by revealing systemic patterns
- Questions should be answerable with text or a simple selection"#;

const FOLLOWUP_SCHEMA: &str = r#"{
  "questions": [
    {
      "id": "q1",
      "question": "Clear, specific question text?",
      "type": "text",
      "context": "Brief explanation of why this question matters",
      "options": null
    },
    {
      "id": "q2",
      "question": "Question that needs a specific choice?",
      "type": "select",
      "context": "Why this helps",
      "options": ["Option 1", "Option 2", "Option 3", "Option 4"]
    }
  ]
}"#;

const REFINEMENT_RULES: &str = r#"HOLISTIC ANALYSIS FRAMEWORK:
With the additional context from follow-up answers, refine your understanding of:
- How symptoms connect across body systems
- Which systemic patterns best explain the symptom constellation
- What root cause most likely explains the interconnected symptoms

Consider the same holistic patterns as before:
- Endocrine/Hormonal, Autoimmune, Nutritional, Metabolic, Inflammatory, Gut-related, Stress/HPA axis

CRITICAL RULES:
- Never diagnose conditions
- Never provide medical advice or treatment recommendations
- Only suggest appropriate specialist types who can address interconnected issues
- Use advisory language: "may indicate", "consider", "could be related to"
- Never use diagnostic language: "you have", "diagnosed with", "you need"
- Provide 1-3 specialist recommendations maximum
- DO NOT recommend "Primary Care Physician", "General Practitioner" or "Family Doctor"
- Focus on specialists who treat root causes and systemic patterns
- Note what the follow-up answers revealed about systemic connections
- Explain why recommendations changed or stayed the same based on holistic analysis"#;

const REFINEMENT_SCHEMA: &str = r#"{
  "analysis": {
    "refinement_summary": "Brief explanation of what the follow-up answers revealed about systemic connections and root causes, and how they affected the holistic analysis",
    "symptom_clusters": [
      {
        "symptoms": ["symptom1", "symptom2"],
        "possible_connections": "Educational explanation considering follow-up context"
      }
    ],
    "potential_root_causes": [
      {
        "category": "Medical category",
        "description": "Educational, non-diagnostic explanation incorporating new information",
        "related_symptoms": ["symptom1"],
        "confidence": "possible|likely|consider"
      }
    ]
  },
  "specialist_recommendations": [
    {
      "specialist_type": "Specific specialist type",
      "reason": "Why this specialist is relevant (considering follow-up answers)",
      "priority": "primary|secondary|consider",
      "what_they_treat": "Brief explanation"
    }
  ],
  "educational_resources": [
    {
      "title": "Resource title",
      "source": "Credible source",
      "relevance": "Why this resource helps"
    }
  ],
  "next_steps": [
    "Actionable advice considering follow-up context"
  ]
}"#;

const JSON_ONLY: &str = "Provide ONLY the JSON response, no additional text.";

/// Prompt for the first-pass analysis of a symptom set
pub fn build_initial_prompt(request: &AnalysisRequest) -> String {
    format!(
        "You are a medical navigation advisor helping users find the right specialist.\n\n\
         {CRITICAL_RULES}\n\n\
         {HOLISTIC_FRAMEWORK}\n\n\
         {user_information}\n\n\
         SYMPTOMS:\n{symptoms}\n\n\
         TASK:\n\
         Analyze these symptoms and provide a JSON response with the following structure:\n\n\
         {ANALYSIS_SCHEMA}\n\n\
         {JSON_ONLY}",
        user_information = user_information(request),
        symptoms = detailed_symptom_list(&request.symptoms),
    )
}

/// Prompt asking for 3-5 clarifying questions about a finished first pass
pub fn build_followup_questions_prompt(symptoms: &[Symptom], prior: &AnalysisResult) -> String {
    let causes: Vec<&str> = prior
        .analysis
        .potential_root_causes
        .iter()
        .take(PRIOR_CONTEXT_LIMIT)
        .map(|cause| cause.category.as_str())
        .collect();

    format!(
        "You are a medical navigation advisor. Based on the initial symptom analysis, generate 3-5 specific follow-up questions that will help narrow down specialist recommendations.\n\n\
         INITIAL SYMPTOMS:\n{symptoms}\n\n\
         INITIAL ANALYSIS:\n\
         Potential Root Causes: {causes}\n\
         Specialist Recommendations: {specialists}\n\n\
         {FOLLOWUP_FOCUS}\n\n\
         OUTPUT FORMAT (JSON only):\n\
         {FOLLOWUP_SCHEMA}\n\n\
         Generate 3-5 questions. {JSON_ONLY}",
        symptoms = brief_symptom_list(symptoms),
        causes = join_or(&causes, "Under evaluation"),
        specialists = join_or(&prior_specialists(prior), "To be determined"),
    )
}

/// Prompt for a second pass that folds follow-up answers into the prior analysis
pub fn build_refinement_prompt(
    request: &AnalysisRequest,
    prior: &AnalysisResult,
    answers: &[FollowupAnswer],
) -> String {
    let transcript = answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let n = i + 1;
            format!(
                "Q{n}: {question}\nA{n}: {answer}",
                question = question_text(answer, prior),
                answer = answer.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a medical navigation advisor performing a REFINED symptom analysis based on follow-up information.\n\n\
         ORIGINAL SYMPTOMS:\n{symptoms}\n\n\
         {user_information}\n\n\
         INITIAL SPECIALIST RECOMMENDATIONS:\n{specialists}\n\n\
         FOLLOW-UP QUESTIONS & ANSWERS:\n{transcript}\n\n\
         TASK:\n\
         Based on the additional information from follow-up answers, provide a REFINED analysis with updated specialist recommendations.\n\n\
         {REFINEMENT_RULES}\n\n\
         OUTPUT FORMAT (JSON only):\n\
         {REFINEMENT_SCHEMA}\n\n\
         {JSON_ONLY}",
        symptoms = brief_symptom_list(&request.symptoms),
        user_information = user_information(request),
        specialists = join_or(&prior_specialists(prior), "Under evaluation"),
    )
}

fn user_information(request: &AnalysisRequest) -> String {
    format!(
        "USER INFORMATION:\n\
         Age Range: {age}\n\
         Existing Conditions: {conditions}\n\
         Current Medications: {medications}\n\
         Additional Context: {context}",
        age = text_or(request.age_range.as_deref(), "Not provided"),
        conditions = join_or(&request.existing_conditions, "None reported"),
        medications = join_or(&request.medications, "None reported"),
        context = text_or(request.additional_context.as_deref(), "None provided"),
    )
}

fn detailed_symptom_list(symptoms: &[Symptom]) -> String {
    symptoms
        .iter()
        .enumerate()
        .map(|(i, symptom)| {
            format!(
                "Symptom {n}:\n- Description: {description}\n- Duration: {duration}\n- Severity: {severity}\n- Frequency: {frequency}",
                n = i + 1,
                description = symptom.description,
                duration = text_or(symptom.duration.as_deref(), NOT_SPECIFIED),
                severity = text_or(symptom.severity.as_deref(), NOT_SPECIFIED),
                frequency = text_or(symptom.frequency.as_deref(), NOT_SPECIFIED),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn brief_symptom_list(symptoms: &[Symptom]) -> String {
    symptoms
        .iter()
        .enumerate()
        .map(|(i, symptom)| {
            format!(
                "{n}. {description} (Duration: {duration}, Severity: {severity})",
                n = i + 1,
                description = symptom.description,
                duration = text_or(symptom.duration.as_deref(), NOT_SPECIFIED),
                severity = text_or(symptom.severity.as_deref(), NOT_SPECIFIED),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn prior_specialists(prior: &AnalysisResult) -> Vec<&str> {
    prior
        .specialist_recommendations
        .iter()
        .take(PRIOR_CONTEXT_LIMIT)
        .map(|rec| rec.specialist_type.as_str())
        .collect()
}

/// Question text for an answer: as sent by the client, else looked up in the
/// prior result by id, else the id itself.
fn question_text<'a>(answer: &'a FollowupAnswer, prior: &'a AnalysisResult) -> &'a str {
    answer
        .question
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .or_else(|| {
            prior
                .followup_questions
                .iter()
                .find(|q| q.id == answer.question_id)
                .map(|q| q.question.as_str())
        })
        .unwrap_or(answer.question_id.as_str())
}

fn text_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(default)
}

fn join_or<S: AsRef<str>>(items: &[S], default: &str) -> String {
    if items.is_empty() {
        default.to_string()
    } else {
        items
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
