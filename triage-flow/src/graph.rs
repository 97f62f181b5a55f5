use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{FlowError, Result},
    task::{NextAction, Task},
};

const DEFAULT_MAX_STEPS: usize = 32;

/// Type alias for edge condition functions
pub type EdgeCondition<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// Edge between tasks in the graph
struct Edge<S> {
    from: String,
    to: String,
    condition: Option<EdgeCondition<S>>,
}

/// A graph of tasks executed against a caller-owned state.
///
/// Once built the graph is read-only, so one instance can serve any number
/// of concurrent executions; each execution brings its own state.
pub struct Graph<S: Send> {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task<S>>>,
    edges: Vec<Edge<S>>,
    start_task_id: Option<String>,
    max_steps: usize,
}

impl<S: Send> Graph<S> {
    /// Run the graph from its start task until a task ends it
    pub async fn execute(&self, state: &mut S) -> Result<ExecutionResult> {
        let start = self
            .start_task_id
            .clone()
            .ok_or_else(|| FlowError::NoStartTask(self.id.clone()))?;
        self.execute_from(&start, state).await
    }

    /// Run the graph starting from a specific task
    pub async fn execute_from(&self, task_id: &str, state: &mut S) -> Result<ExecutionResult> {
        let mut current = task_id.to_string();
        let mut visited: Vec<String> = Vec::new();

        loop {
            if visited.len() >= self.max_steps {
                return Err(FlowError::StepLimitExceeded {
                    graph_id: self.id.clone(),
                    max_steps: self.max_steps,
                });
            }

            let task = self
                .get_task(&current)
                .ok_or_else(|| FlowError::TaskNotFound(current.clone()))?;

            debug!(graph_id = %self.id, task_id = %current, "Running task");
            let result = task.run(state).await?;
            visited.push(current.clone());

            let next = match &result.next_action {
                NextAction::End => None,
                NextAction::Continue => self.find_next_task(&current, state),
                NextAction::GoTo(target_id) => {
                    if !self.tasks.contains_key(target_id) {
                        return Err(FlowError::TaskNotFound(target_id.clone()));
                    }
                    Some(target_id.clone())
                }
            };

            match next {
                Some(next_task_id) => current = next_task_id,
                None => {
                    return Ok(ExecutionResult {
                        visited,
                        status_message: result.status_message,
                    });
                }
            }
        }
    }

    /// Find the next task based on edges and conditions.
    ///
    /// Edges are checked in insertion order; the first unconditional edge or
    /// conditional edge whose predicate holds wins.
    pub fn find_next_task(&self, current_task_id: &str, state: &S) -> Option<String> {
        self.edges
            .iter()
            .filter(|edge| edge.from == current_task_id)
            .find(|edge| match &edge.condition {
                Some(condition) => condition(state),
                None => true,
            })
            .map(|edge| edge.to.clone())
    }

    /// Get the start task ID
    pub fn start_task_id(&self) -> Option<&str> {
        self.start_task_id.as_deref()
    }

    /// Get a task by ID
    pub fn get_task(&self, task_id: &str) -> Option<Arc<dyn Task<S>>> {
        self.tasks.get(task_id).cloned()
    }
}

/// Builder for creating graphs
pub struct GraphBuilder<S: Send> {
    graph: Graph<S>,
}

impl<S: Send> GraphBuilder<S> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph {
                id: id.into(),
                tasks: HashMap::new(),
                edges: Vec::new(),
                start_task_id: None,
                max_steps: DEFAULT_MAX_STEPS,
            },
        }
    }

    /// Add a task; the first task added becomes the start task
    pub fn add_task(mut self, task: Arc<dyn Task<S>>) -> Self {
        let task_id = task.id().to_string();
        if self.graph.tasks.is_empty() {
            self.graph.start_task_id = Some(task_id.clone());
        }
        self.graph.tasks.insert(task_id, task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: None,
        });
        self
    }

    /// Branch on the state: go to `yes` when `condition` holds, otherwise to `no`
    pub fn add_conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        condition: F,
        yes: impl Into<String>,
        no: impl Into<String>,
    ) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        let from = from.into();
        self.graph.edges.push(Edge {
            from: from.clone(),
            to: yes.into(),
            condition: Some(Arc::new(condition)),
        });
        self.graph.edges.push(Edge {
            from,
            to: no.into(),
            condition: None,
        });
        self
    }

    pub fn set_start_task(mut self, task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        if self.graph.tasks.contains_key(&task_id) {
            self.graph.start_task_id = Some(task_id);
        }
        self
    }

    /// Upper bound on tasks run by one execution, guarding against cycles
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.graph.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Graph<S> {
        self.graph
    }
}

/// Outcome of a graph execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Task ids in the order they ran
    pub visited: Vec<String>,
    /// Status message of the task that ended the run
    pub status_message: Option<String>,
}

impl ExecutionResult {
    pub fn last_task(&self) -> Option<&str> {
        self.visited.last().map(String::as_str)
    }
}
