//! HTTP adapter
//!
//! Thin axum front end over [`TriagePipeline::analyze`].
//!
//! # Endpoints
//!
//! - POST /api/analyze-symptoms - Analyze one utterance, body `{"symptoms": "..."}`
//! - GET /api/health - Liveness and build information

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sdk::errors::EngineError;
use sdk::types::{FailureClass, ResponsePayload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::triage::pipeline::{TriagePipeline, VALIDATION_MESSAGE};

/// Request body of `POST /api/analyze-symptoms`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Missing is treated as empty and rejected by the pipeline
    #[serde(default)]
    pub symptoms: String,
}

/// Response body of `GET /api/health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub oracle: String,
}

#[derive(Clone)]
struct ServerState {
    pipeline: Arc<TriagePipeline>,
    oracle: String,
}

/// Build the router. `oracle` is the provider name reported by the health check.
pub fn router(pipeline: Arc<TriagePipeline>, oracle: &str, config: &ServerConfig) -> Router {
    let state = ServerState {
        pipeline,
        oracle: oracle.to_string(),
    };

    let app = Router::new()
        .route("/api/analyze-symptoms", post(analyze_symptoms))
        .route("/api/health", get(health))
        .with_state(state);

    if config.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind `config.bind_addr` and serve until Ctrl-C
pub async fn serve(
    pipeline: Arc<TriagePipeline>,
    oracle: &str,
    config: &ServerConfig,
) -> Result<(), EngineError> {
    let app = router(pipeline, oracle, config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| {
            EngineError::Network(format!("Failed to bind to {}: {}", config.bind_addr, e))
        })?;

    tracing::info!("Leafdoc listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
        .map_err(|e| EngineError::Network(format!("HTTP server error: {}", e)))
}

/// HTTP status for a payload; successful payloads are always 200
pub fn status_for(payload: &ResponsePayload) -> StatusCode {
    payload
        .failure_class()
        .and_then(|class| StatusCode::from_u16(class.status_code()).ok())
        .unwrap_or(StatusCode::OK)
}

async fn analyze_symptoms(
    State(state): State<ServerState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let payload = match body {
        Ok(Json(request)) => state.pipeline.analyze(&request.symptoms).await,
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            ResponsePayload::error(FailureClass::Validation, VALIDATION_MESSAGE)
        }
    };

    (status_for(&payload), Json(payload)).into_response()
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        oracle: state.oracle,
    })
}
