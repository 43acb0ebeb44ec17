//! HTTP route handlers for the agent server.

pub mod agent;

use axum::Json;

use crate::dto::StatusResponse;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse { status: "healthy", service: "Internal Agent Service" })
}
