use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use triage_flow::{FlowError, NextAction, Task, TaskResult};

use super::state::AnalysisState;
use crate::gateway::ModelGateway;
use crate::parser::decode_followup_questions;
use crate::prompts::build_followup_questions_prompt;

/// Asks the model for clarifying questions about the initial analysis.
/// Failure leaves the analysis intact with no questions.
pub struct FollowupQuestionsTask {
    gateway: Arc<ModelGateway>,
}

impl FollowupQuestionsTask {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Task<AnalysisState> for FollowupQuestionsTask {
    async fn run(&self, state: &mut AnalysisState) -> triage_flow::Result<TaskResult> {
        let result = state.result.as_mut().ok_or_else(|| {
            FlowError::TaskExecutionFailed("no analysis to ask follow-up questions about".into())
        })?;

        let prompt = build_followup_questions_prompt(&state.request.symptoms, result);
        match self
            .gateway
            .call_model("followup_questions", &prompt, decode_followup_questions)
            .await
        {
            Ok(questions) => {
                info!(questions = questions.len(), "Follow-up questions generated");
                result.followup_questions = questions;
            }
            Err(e) => {
                warn!(error = %e, "Follow-up questions unavailable, continuing without them");
                result.followup_questions = Vec::new();
            }
        }

        Ok(TaskResult::new(NextAction::End))
    }
}
