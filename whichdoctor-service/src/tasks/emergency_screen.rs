use async_trait::async_trait;
use tracing::{info, warn};
use triage_flow::{NextAction, Task, TaskResult};

use super::state::AnalysisState;
use crate::emergency::matched_keyword;
use crate::responses::emergency_result;

/// Routes emergencies straight to the emergency room without calling the model
pub struct EmergencyScreenTask;

#[async_trait]
impl Task<AnalysisState> for EmergencyScreenTask {
    async fn run(&self, state: &mut AnalysisState) -> triage_flow::Result<TaskResult> {
        let refinement = state.is_refinement();

        if let Some(keyword) = matched_keyword(&state.request.symptoms) {
            warn!(keyword, refinement, "Emergency symptoms detected, skipping model");
            state.result = Some(emergency_result(refinement));
            return Ok(TaskResult::new_with_status(
                NextAction::End,
                Some("Emergency symptoms detected".to_string()),
            ));
        }

        info!(
            symptoms = state.request.symptoms.len(),
            refinement, "No emergency symptoms"
        );
        Ok(TaskResult::new(NextAction::Continue))
    }
}
