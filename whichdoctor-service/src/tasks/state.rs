use crate::models::{AnalysisRequest, AnalysisResult, FollowupAnswer};

/// What the graph is being asked to produce
#[derive(Debug, Clone)]
pub enum AnalysisMode {
    Initial,
    Refinement {
        prior: AnalysisResult,
        answers: Vec<FollowupAnswer>,
    },
}

/// Per-request state threaded through the analysis graph.
///
/// `result` stays `None` until a task produces an answer; the task that
/// ends the run is the one that set it last.
#[derive(Debug, Clone)]
pub struct AnalysisState {
    pub request: AnalysisRequest,
    pub mode: AnalysisMode,
    pub result: Option<AnalysisResult>,
}

impl AnalysisState {
    pub fn initial(request: AnalysisRequest) -> Self {
        Self {
            request,
            mode: AnalysisMode::Initial,
            result: None,
        }
    }

    pub fn refinement(
        request: AnalysisRequest,
        prior: AnalysisResult,
        answers: Vec<FollowupAnswer>,
    ) -> Self {
        Self {
            request,
            mode: AnalysisMode::Refinement { prior, answers },
            result: None,
        }
    }

    pub fn is_refinement(&self) -> bool {
        matches!(self.mode, AnalysisMode::Refinement { .. })
    }
}
