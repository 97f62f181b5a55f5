pub mod error;
pub mod graph;
pub mod task;

// Re-export commonly used types
pub use error::{FlowError, Result};
pub use graph::{EdgeCondition, ExecutionResult, Graph, GraphBuilder};
pub use task::{NextAction, Task, TaskResult};
