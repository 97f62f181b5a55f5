use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use triage_flow::{FlowError, NextAction, Task, TaskResult};

use super::flag_generic_practitioners;
use super::state::{AnalysisMode, AnalysisState};
use crate::gateway::ModelGateway;
use crate::models::AnalysisResult;
use crate::parser::decode_analysis;
use crate::prompts::build_refinement_prompt;
use crate::responses::refinement_failed;

/// Second pass folding the user's answers into the prior analysis.
/// Always terminal; on failure the prior analysis is handed back.
pub struct RefinedAnalysisTask {
    gateway: Arc<ModelGateway>,
}

impl RefinedAnalysisTask {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Task<AnalysisState> for RefinedAnalysisTask {
    async fn run(&self, state: &mut AnalysisState) -> triage_flow::Result<TaskResult> {
        let AnalysisMode::Refinement { prior, answers } = &state.mode else {
            return Err(FlowError::TaskExecutionFailed(
                "refinement requested without a prior analysis".into(),
            ));
        };
        info!(answers = answers.len(), "Starting refined analysis");

        let prompt = build_refinement_prompt(&state.request, prior, answers);
        let (result, status) = match self
            .gateway
            .call_model("refined_analysis", &prompt, decode_analysis)
            .await
        {
            Ok(payload) => {
                let result = AnalysisResult::from_payload(payload, true);
                flag_generic_practitioners(&result);
                info!(
                    specialists = result.specialist_recommendations.len(),
                    "Refined analysis complete"
                );
                (result, None)
            }
            Err(e) => {
                error!(error = %e, "Refined analysis failed, returning prior analysis");
                (
                    refinement_failed(prior),
                    Some("Returned prior analysis".to_string()),
                )
            }
        };

        state.result = Some(result);
        Ok(TaskResult::new_with_status(NextAction::End, status))
    }
}
