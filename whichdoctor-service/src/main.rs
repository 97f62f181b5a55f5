use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whichdoctor_service::{
    AppState, GENERATION_SETTINGS, GeminiBackend, LogFormat, ModelGateway, RetryPolicy,
    ServiceConfig, SymptomAnalyzer, create_app,
};

/// Initialize tracing; `LOG_FORMAT=pretty` for development, JSON otherwise
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "whichdoctor_service=debug,triage_flow=debug,tower_http=debug".into()
    });

    match LogFormat::from_env() {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let backend = Arc::new(GeminiBackend::new(&config.api_key, GENERATION_SETTINGS));
    let gateway = Arc::new(ModelGateway::new(
        backend,
        RetryPolicy::default(),
        config.model_timeout,
    ));
    let state = AppState::new(SymptomAnalyzer::new(gateway));
    let app = create_app(state, config.static_dir.as_deref());

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        model = GENERATION_SETTINGS.model,
        timeout_secs = config.model_timeout.as_secs(),
        "Server running on http://{addr}"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
