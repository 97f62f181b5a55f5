//! Scripted model doubles and canned model replies shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::gateway::ModelGateway;
use crate::llm::{CompletionBackend, ModelError};
use crate::retry::RetryPolicy;

pub(crate) const ANALYSIS_JSON: &str = r#"{
  "analysis": {
    "symptom_clusters": [
      {
        "symptoms": ["Persistent fatigue and weakness", "Unexplained weight gain"],
        "possible_connections": "Low energy and weight change together may indicate a slowed metabolism",
        "system_involvement": "Endocrine and Metabolic"
      }
    ],
    "potential_root_causes": [
      {
        "category": "Endocrine/Hormonal",
        "description": "Thyroid function could be related to several of these symptoms",
        "related_symptoms": ["fatigue", "weight gain"],
        "confidence": "possible",
        "systemic_explanation": "Thyroid hormones regulate metabolism across the body"
      }
    ]
  },
  "specialist_recommendations": [
    {
      "specialist_type": "Endocrinologist",
      "reason": "Consider a hormonal evaluation for the combined fatigue and weight change",
      "priority": "primary",
      "what_they_treat": "Thyroid, adrenal and metabolic conditions"
    },
    {
      "specialist_type": "Hematologist",
      "reason": "Fatigue may indicate a blood-related cause worth ruling out",
      "priority": "secondary",
      "what_they_treat": "Anemia and other blood disorders"
    }
  ],
  "educational_resources": [
    {
      "title": "Thyroid Disease",
      "source": "Mayo Clinic",
      "relevance": "Explains how thyroid function affects energy and weight"
    }
  ],
  "next_steps": [
    "Keep a symptom diary for two weeks",
    "Bring a list of current medications to your appointment"
  ]
}"#;

pub(crate) const FOLLOWUP_JSON: &str = r#"{
  "questions": [
    {
      "id": "q1",
      "question": "Do you often feel cold when others are comfortable?",
      "type": "text",
      "context": "Cold sensitivity helps separate metabolic from other causes",
      "options": null
    },
    {
      "id": "q2",
      "question": "When is your fatigue at its worst?",
      "type": "select",
      "context": "Timing points at different body systems",
      "options": ["Morning", "Afternoon", "All day"]
    }
  ]
}"#;

/// Backend that replays queued replies in order. Once the queue is empty it
/// repeats `fallback` if set, otherwise fails.
pub(crate) struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    fallback: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub(crate) fn new(replies: impl IntoIterator<Item = Result<String, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            fallback: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn always(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.replies.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(reply), _) => reply,
            (None, Some(fallback)) => Ok(fallback.clone()),
            (None, None) => Err(ModelError::Request("script exhausted".to_string())),
        }
    }
}

/// Gateway with the production retry schedule over a scripted backend
pub(crate) fn scripted_gateway(backend: Arc<ScriptedBackend>) -> Arc<ModelGateway> {
    Arc::new(ModelGateway::new(
        backend,
        RetryPolicy::default(),
        Duration::from_secs(5),
    ))
}
