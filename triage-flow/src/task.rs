use async_trait::async_trait;

use crate::error::Result;

/// Result of a task execution
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Next action to take
    pub next_action: NextAction,
    /// Short note on what the task did, surfaced in the execution result
    pub status_message: Option<String>,
}

impl TaskResult {
    pub fn new(next_action: NextAction) -> Self {
        Self {
            next_action,
            status_message: None,
        }
    }

    pub fn new_with_status(next_action: NextAction, status_message: Option<String>) -> Self {
        Self {
            next_action,
            status_message,
        }
    }
}

/// Defines what should happen after a task completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Follow the outgoing edges of the current task
    Continue,
    /// Go to a specific task by ID
    GoTo(String),
    /// Stop; the outcome lives in the state
    End,
}

/// Core trait that all tasks must implement.
///
/// `S` is the state owned by the caller of [`Graph::execute`](crate::Graph::execute).
/// A task reads its inputs from it and writes its outputs back into it.
#[async_trait]
pub trait Task<S>: Send + Sync
where
    S: Send,
{
    /// Unique identifier for this task
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Execute the task against the given state
    async fn run(&self, state: &mut S) -> Result<TaskResult>;
}
