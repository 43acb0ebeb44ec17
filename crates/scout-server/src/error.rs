//! Application error types and Axum response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scout_core::AgentError;
use serde::Serialize;

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    /// Request body failed validation.
    Validation(String),
    /// The agent run failed. Carries the agent's error text.
    AgentFailed(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AgentFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Invalid request",
            AppError::AgentFailed(_) => "Agent execution failed",
        }
    }
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        AppError::AgentFailed(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.category();
        let detail = match self {
            AppError::Validation(detail) | AppError::AgentFailed(detail) => detail,
        };
        (status, Json(ErrorResponse { error, detail })).into_response()
    }
}
