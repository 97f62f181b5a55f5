use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use triage_flow::{NextAction, Task, TaskResult};

use super::flag_generic_practitioners;
use super::state::AnalysisState;
use crate::gateway::ModelGateway;
use crate::models::AnalysisResult;
use crate::parser::decode_analysis;
use crate::prompts::build_initial_prompt;
use crate::responses::fallback_result;

/// First model round-trip: clusters, root causes and specialists.
///
/// A failed call ends the run with the fixed fallback result instead of an
/// error, so the caller always has something to show.
pub struct InitialAnalysisTask {
    gateway: Arc<ModelGateway>,
}

impl InitialAnalysisTask {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Task<AnalysisState> for InitialAnalysisTask {
    async fn run(&self, state: &mut AnalysisState) -> triage_flow::Result<TaskResult> {
        info!("Starting initial analysis");

        let prompt = build_initial_prompt(&state.request);
        match self
            .gateway
            .call_model("initial_analysis", &prompt, decode_analysis)
            .await
        {
            Ok(payload) => {
                let result = AnalysisResult::from_payload(payload, false);
                flag_generic_practitioners(&result);
                info!(
                    clusters = result.analysis.symptom_clusters.len(),
                    specialists = result.specialist_recommendations.len(),
                    "Initial analysis complete"
                );
                state.result = Some(result);
                Ok(TaskResult::new(NextAction::Continue))
            }
            Err(e) => {
                error!(error = %e, "Initial analysis failed, returning fallback");
                state.result = Some(fallback_result());
                Ok(TaskResult::new_with_status(
                    NextAction::End,
                    Some("Returned fallback analysis".to_string()),
                ))
            }
        }
    }
}
