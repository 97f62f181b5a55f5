pub mod emergency_screen;
pub mod followup_questions;
pub mod initial_analysis;
pub mod refined_analysis;
pub mod state;

pub use emergency_screen::EmergencyScreenTask;
pub use followup_questions::FollowupQuestionsTask;
pub use initial_analysis::InitialAnalysisTask;
pub use refined_analysis::RefinedAnalysisTask;
pub use state::{AnalysisMode, AnalysisState};

use tracing::warn;

use crate::models::AnalysisResult;

/// Generic practitioners are forbidden by the prompt but not stripped from
/// the result; log them so prompt regressions show up.
pub(crate) fn flag_generic_practitioners(result: &AnalysisResult) {
    for rec in result
        .specialist_recommendations
        .iter()
        .filter(|rec| rec.is_generic_practitioner())
    {
        warn!(specialist = %rec.specialist_type, "Model recommended a generic practitioner");
    }
}
