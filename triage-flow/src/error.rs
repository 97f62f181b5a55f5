use thiserror::Error;

/// Errors raised while running a task graph
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Graph '{0}' has no start task")]
    NoStartTask(String),

    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("Graph '{graph_id}' did not finish within {max_steps} steps")]
    StepLimitExceeded { graph_id: String, max_steps: usize },
}

pub type Result<T> = std::result::Result<T, FlowError>;
