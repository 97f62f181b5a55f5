use async_trait::async_trait;
use rig::{agent::Agent, client::CompletionClient, completion::Prompt, providers::gemini};
use thiserror::Error;

/// Fixed generation settings; not configurable per request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub model: &'static str,
    pub temperature: f64,
    pub max_output_tokens: u64,
}

pub const GENERATION_SETTINGS: GenerationSettings = GenerationSettings {
    model: "gemini-2.5-flash",
    // low for consistent, conservative medical wording
    temperature: 0.3,
    max_output_tokens: 4096,
};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Request(String),
}

/// A text-completion endpoint the gateway can call.
///
/// Implemented by [`GeminiBackend`] in production and by scripted doubles in
/// tests.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Gemini completion backend built on a rig agent
pub struct GeminiBackend {
    agent: Agent<gemini::completion::CompletionModel>,
    settings: GenerationSettings,
}

impl GeminiBackend {
    pub fn new(api_key: &str, settings: GenerationSettings) -> Self {
        let client = gemini::Client::new(api_key);
        let agent = client
            .agent(settings.model)
            .temperature(settings.temperature)
            .max_tokens(settings.max_output_tokens)
            .build();
        Self { agent, settings }
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn model_name(&self) -> &str {
        self.settings.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.agent
            .prompt(prompt)
            .await
            .map_err(|e| ModelError::Request(e.to_string()))
    }
}
