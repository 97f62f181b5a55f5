//! Single entry point for model calls.
//!
//! An attempt only counts as a success once the reply is non-empty and the
//! caller's decoder accepts it, so callers get a typed value or a definitive
//! failure and never unparseable text.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info};

use crate::llm::{CompletionBackend, ModelError};
use crate::parser::ParseError;
use crate::retry::{RetryFailure, RetryPolicy};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] ModelError),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Model call failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ApiError>,
    },
}

impl ApiError {
    /// Every per-attempt failure is worth another try
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RetriesExhausted { .. })
    }
}

pub struct ModelGateway {
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
    call_timeout: Duration,
}

impl ModelGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>, retry: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            backend,
            retry,
            call_timeout,
        }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Send `prompt` to the model and decode the reply with `decode`,
    /// retrying transport faults, timeouts, empty replies and decode failures
    /// with exponential backoff.
    pub async fn call_model<T, D>(&self, label: &str, prompt: &str, decode: D) -> Result<T, ApiError>
    where
        T: Send,
        D: Fn(&str) -> Result<T, ParseError> + Send + Sync,
    {
        let decode = &decode;
        self.retry
            .run(
                label,
                |attempt| self.attempt(label, prompt, attempt, decode),
                ApiError::is_retryable,
            )
            .await
            .map_err(|failure| match failure {
                RetryFailure::Exhausted { attempts, last } => {
                    error!(
                        operation = %label,
                        model = %self.model_name(),
                        attempts,
                        error = %last,
                        "Model call failed, retries exhausted"
                    );
                    ApiError::RetriesExhausted {
                        attempts,
                        last: Box::new(last),
                    }
                }
                RetryFailure::Fatal { error, .. } => error,
            })
    }

    async fn attempt<T, D>(&self, label: &str, prompt: &str, attempt: u32, decode: &D) -> Result<T, ApiError>
    where
        D: Fn(&str) -> Result<T, ParseError>,
    {
        let started = Instant::now();
        let raw = tokio::time::timeout(self.call_timeout, self.backend.complete(prompt))
            .await
            .map_err(|_| ApiError::Timeout(self.call_timeout))??;

        if raw.trim().is_empty() {
            return Err(ApiError::EmptyResponse);
        }

        let value = decode(&raw)?;
        info!(
            operation = %label,
            attempt = attempt + 1,
            response_len = raw.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model call succeeded"
        );
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::decode_analysis;
    use crate::test_support::{ANALYSIS_JSON, ScriptedBackend};
    use async_trait::async_trait;

    fn gateway(backend: Arc<dyn CompletionBackend>) -> ModelGateway {
        ModelGateway::new(backend, RetryPolicy::default(), Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_from_malformed_reply() {
        let backend = ScriptedBackend::new([
            Ok("Sorry, here you go: {\"analysis\": ".to_string()),
            Ok(format!("```json\n{ANALYSIS_JSON}\n```")),
        ]);
        let payload = gateway(backend.clone())
            .call_model("analysis", "prompt", decode_analysis)
            .await
            .unwrap();

        assert_eq!(payload.specialist_recommendations.len(), 2);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_and_transport_failures_are_retried() {
        let backend = ScriptedBackend::new([
            Ok("   ".to_string()),
            Err(ModelError::Request("connection reset".to_string())),
            Ok(ANALYSIS_JSON.to_string()),
        ]);
        let result = gateway(backend.clone())
            .call_model("analysis", "prompt", decode_analysis)
            .await;

        assert!(result.is_ok());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_surfaces_last_error() {
        let backend = ScriptedBackend::always("no json here");
        let started = tokio::time::Instant::now();

        let err = gateway(backend.clone())
            .call_model("analysis", "prompt", decode_analysis)
            .await
            .unwrap_err();

        assert_eq!(backend.calls(), 4);
        match err {
            ApiError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, ApiError::Parse(ParseError::NoJsonObject { .. })));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(7) && elapsed < Duration::from_secs(8));
    }

    struct StalledBackend;

    #[async_trait]
    impl CompletionBackend for StalledBackend {
        fn model_name(&self) -> &str {
            "stalled"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ANALYSIS_JSON.to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_call_hits_deadline() {
        let gateway = ModelGateway::new(
            Arc::new(StalledBackend),
            RetryPolicy::none(),
            Duration::from_secs(30),
        );
        let err = gateway
            .call_model("analysis", "prompt", decode_analysis)
            .await
            .unwrap_err();

        match err {
            ApiError::RetriesExhausted { attempts: 1, last } => {
                assert!(matches!(*last, ApiError::Timeout(d) if d == Duration::from_secs(30)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
