//! Sends one short prompt to Gemini to confirm the credential and network
//! path work before starting the service.

use anyhow::{Context, bail};
use tracing::info;
use whichdoctor_service::config::API_KEY_VAR;
use whichdoctor_service::{CompletionBackend, GENERATION_SETTINGS, GeminiBackend};

const SAMPLE_PROMPT: &str = "You are a medical advisor helping users find the right specialist.

Symptoms: Persistent fatigue, unexplained weight gain, cold sensitivity

Based on these symptoms, suggest ONE appropriate medical specialist type and explain why.
Keep your response brief (2-3 sentences).";

const TROUBLESHOOTING: &str = "Troubleshooting:
1. Verify the API key is correct
2. Check your internet connection
3. Ensure the API key has the right permissions
4. Check whether you have exceeded rate limits";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "check_connection=info,whichdoctor_service=info".into()),
        )
        .init();

    let api_key = std::env::var(API_KEY_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .with_context(|| format!("{API_KEY_VAR} not set"))?;
    info!(key_chars = api_key.len(), "API key loaded");

    let backend = GeminiBackend::new(&api_key, GENERATION_SETTINGS);
    info!(model = backend.model_name(), "Sending sample prompt");

    let reply = match backend.complete(SAMPLE_PROMPT).await {
        Ok(reply) => reply,
        Err(e) => {
            eprintln!("{TROUBLESHOOTING}");
            return Err(e).context("Gemini API call failed");
        }
    };
    if reply.trim().is_empty() {
        bail!("Empty response from Gemini API");
    }

    println!("{}\nSAMPLE RESPONSE:\n{}\n{reply}\n{}", "-".repeat(60), "-".repeat(60), "-".repeat(60));
    info!("Gemini API is ready for use");
    Ok(())
}
