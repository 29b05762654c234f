//! HTTP API for the janitor service.
//!
//! Provides endpoints for:
//! - The VCS webhook receiver
//! - Liveness and health checks

mod webhook;

pub use webhook::verify_signature;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::JanitorError;
use crate::reconcile::Reconciler;

/// Shared application state for the janitor service.
#[derive(Clone)]
pub struct AppState {
    /// Reconciler invoked by the webhook path.
    pub reconciler: Arc<Reconciler>,
    /// Shared secret for webhook signature verification.
    pub webhook_secret: Arc<str>,
}

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Liveness
        .route("/", get(index))
        .route("/health", get(health_check))
        // Webhook receiver
        .route("/webhooks/github", post(webhook::receive))
        .with_state(state)
}

/// Liveness endpoint with a fixed success response.
async fn index() -> &'static str {
    "OK"
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Health response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Error response body.
///
/// Internal failures surface only the error message, never stack details;
/// the full context goes to the log.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

pub(crate) const fn error_to_status(error: &JanitorError) -> StatusCode {
    match error {
        JanitorError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
