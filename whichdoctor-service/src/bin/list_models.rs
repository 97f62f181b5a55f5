//! Lists the Gemini models visible to the configured API key.

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::{debug, info};
use whichdoctor_service::config::API_KEY_VAR;

const MODELS_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "list_models=info".into()),
        )
        .init();

    let api_key = std::env::var(API_KEY_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .with_context(|| format!("{API_KEY_VAR} not set"))?;

    let client = reqwest::Client::new();
    let mut page_token: Option<String> = None;
    let mut total = 0;

    println!("Available models:");
    loop {
        let mut query = vec![("key", api_key.as_str())];
        if let Some(token) = page_token.as_deref() {
            query.push(("pageToken", token));
        }

        let response = client
            .get(MODELS_URL)
            .query(&query)
            .send()
            .await
            .context("Failed to reach the Gemini API")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gemini API returned {status}: {body}");
        }

        let page: ModelList = response
            .json()
            .await
            .context("Unexpected model list format")?;
        debug!(models = page.models.len(), "Fetched page");

        for model in &page.models {
            println!("  - {}", model.name);
            if !model.supported_generation_methods.is_empty() {
                println!("    Methods: {}", model.supported_generation_methods.join(", "));
            }
        }
        total += page.models.len();

        match page.next_page_token.filter(|token| !token.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    info!(total, "Listed models");
    Ok(())
}
