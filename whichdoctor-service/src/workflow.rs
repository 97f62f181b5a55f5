//! The analysis graph and the two entry points that run it.
//!
//! ```text
//! EmergencyScreen ──emergency──▶ end
//!        │ refinement?
//!        ├── yes ──▶ RefinedAnalysis ──▶ end
//!        └── no  ──▶ InitialAnalysis ──▶ FollowupQuestions ──▶ end
//! ```

use std::any::type_name;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};
use triage_flow::{Graph, GraphBuilder};

use crate::gateway::ModelGateway;
use crate::models::{AnalysisRequest, AnalysisResult, FollowupAnswer};
use crate::responses::{fallback_result, refinement_failed};
use crate::tasks::{
    AnalysisMode, AnalysisState, EmergencyScreenTask, FollowupQuestionsTask,
    InitialAnalysisTask, RefinedAnalysisTask,
};

pub const GRAPH_ID: &str = "symptom_analysis";

/// Runs symptom analyses. Holds no per-request state, so one instance is
/// shared by every request.
pub struct SymptomAnalyzer {
    graph: Graph<AnalysisState>,
}

impl SymptomAnalyzer {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        let screen = Arc::new(EmergencyScreenTask);
        let initial = Arc::new(InitialAnalysisTask::new(gateway.clone()));
        let followup = Arc::new(FollowupQuestionsTask::new(gateway.clone()));
        let refined = Arc::new(RefinedAnalysisTask::new(gateway));

        let graph = GraphBuilder::<AnalysisState>::new(GRAPH_ID)
            .add_task(screen)
            .add_task(initial)
            .add_task(followup)
            .add_task(refined)
            .add_conditional_edge(
                type_name::<EmergencyScreenTask>(),
                AnalysisState::is_refinement,
                type_name::<RefinedAnalysisTask>(),
                type_name::<InitialAnalysisTask>(),
            )
            .add_edge(
                type_name::<InitialAnalysisTask>(),
                type_name::<FollowupQuestionsTask>(),
            )
            .set_start_task(type_name::<EmergencyScreenTask>())
            .build();

        Self { graph }
    }

    /// Initial analysis of a symptom set. Never fails: emergencies get the
    /// emergency result and model failures the fixed fallback.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisResult {
        let mut state = AnalysisState::initial(request);
        self.run(&mut state).await;
        state.result.unwrap_or_else(fallback_result)
    }

    /// Refine `prior` with the user's answers. On failure `prior` comes back
    /// with `error` set and `is_refined = false`.
    pub async fn analyze_refined(
        &self,
        request: AnalysisRequest,
        prior: AnalysisResult,
        answers: Vec<FollowupAnswer>,
    ) -> AnalysisResult {
        let mut state = AnalysisState::refinement(request, prior, answers);
        self.run(&mut state).await;
        match (state.result, state.mode) {
            (Some(result), _) => result,
            (None, AnalysisMode::Refinement { prior, .. }) => refinement_failed(&prior),
            (None, AnalysisMode::Initial) => fallback_result(),
        }
    }

    async fn run(&self, state: &mut AnalysisState) {
        let started = Instant::now();
        match self.graph.execute(state).await {
            Ok(execution) => info!(
                graph = GRAPH_ID,
                steps = execution.visited.len(),
                last_task = execution.last_task().unwrap_or_default(),
                status = execution.status_message.as_deref().unwrap_or("completed"),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Symptom analysis finished"
            ),
            Err(e) => error!(graph = GRAPH_ID, error = %e, "Symptom analysis graph failed"),
        }
    }
}
