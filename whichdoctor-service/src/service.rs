//! HTTP surface: health check and the analyze endpoint.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{Next, from_fn},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::models::{AnalysisRequest, AnalysisResult};
use crate::validation::{ValidationError, validate_payload};
use crate::workflow::SymptomAnalyzer;

pub const SERVICE_NAME: &str = "WhichDoctor API";
pub const CORRELATION_HEADER: &str = "x-correlation-id";
const INTERNAL_ERROR: &str = "Internal server error. Please try again later.";

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<SymptomAnalyzer>,
}

impl AppState {
    pub fn new(analyzer: SymptomAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: ValidationError) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Build the router. When `static_dir` is set, unmatched paths are served
/// from it.
pub fn create_app(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/analyze", post(analyze));

    router = match static_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Serving static files");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router.fallback(not_found),
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(correlation_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Tags every request with a fresh correlation id, both in a tracing span
/// and in the request/response headers.
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header_value {
        request.headers_mut().insert(CORRELATION_HEADER, value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header_value {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    error!("Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: INTERNAL_ERROR.to_string(),
        }),
    )
        .into_response()
}

async fn not_found() -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Endpoint not found".to_string(),
        }),
    )
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalysisResult>, HandlerError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected request body");
        bad_request(ValidationError::InvalidJson)
    })?;

    validate_payload(&payload).map_err(|e| {
        warn!(error = %e, "Request failed validation");
        bad_request(e)
    })?;

    let mut request: AnalysisRequest = serde_json::from_value(payload).map_err(|e| {
        warn!(error = %e, "Request could not be decoded");
        bad_request(ValidationError::Malformed(e.to_string()))
    })?;

    info!(
        symptoms = request.symptoms.len(),
        refinement = request.is_refinement,
        "Processing analyze request"
    );

    let result = if request.is_refinement {
        let prior = request
            .initial_analysis
            .take()
            .ok_or_else(|| bad_request(ValidationError::MissingInitialAnalysis))?;
        let answers = std::mem::take(&mut request.followup_answers);
        state.analyzer.analyze_refined(request, prior, answers).await
    } else {
        state.analyzer.analyze(request).await
    };

    Ok(Json(result))
}
