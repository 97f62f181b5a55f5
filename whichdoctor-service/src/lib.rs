pub mod config;
pub mod emergency;
pub mod gateway;
pub mod llm;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod responses;
pub mod retry;
pub mod service;
pub mod tasks;
pub mod validation;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, LogFormat, ServiceConfig};
pub use gateway::{ApiError, ModelGateway};
pub use llm::{CompletionBackend, GENERATION_SETTINGS, GeminiBackend, GenerationSettings, ModelError};
pub use models::{AnalysisRequest, AnalysisResult, FollowupAnswer, Symptom};
pub use retry::RetryPolicy;
pub use service::{AppState, create_app};
pub use workflow::SymptomAnalyzer;
