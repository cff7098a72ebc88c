//! HTTP router construction: metrics, active config and health.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::error;

use crate::state::AppState;

const YAML_CONTENT_TYPE: &str = "application/yaml";

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/config", get(config))
        .route("/health", get(health))
        .with_state(state)
}

/// Prometheus text exposition of the run counters.
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.reporter.render() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// The job set currently scheduled, as YAML.
async fn config(State(state): State<Arc<AppState>>) -> Response {
    let job_set = state.job_set.read().await;
    match job_set.to_yaml() {
        Ok(body) => ([(header::CONTENT_TYPE, YAML_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to serialize job set");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health() -> &'static str {
    "OK"
}
