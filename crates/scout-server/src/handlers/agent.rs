//! Internal agent HTTP handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use scout_core::AgentMessage;
use tracing::{error, info, warn};

use crate::dto::{AgentQueryRequest, AgentQueryResponse, LegacyQuery};
use crate::error::AppError;
use crate::services::agent as agent_service;
use crate::ServerState;

const LOG_PREVIEW_CHARS: usize = 50;

/// Answers a query with the final answer plus the typed tool executions.
pub async fn query(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AgentQueryRequest>, JsonRejection>,
) -> Result<Json<AgentQueryResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    req.validate()?;

    let preview: String = req.query.chars().take(LOG_PREVIEW_CHARS).collect();
    info!("Processing query: {}", preview);

    let response = agent_service::answer(state.agent.as_ref(), &req.query).await.map_err(|e| {
        error!("Agent execution failed: {:?}", e);
        e
    })?;

    info!(
        tools = ?response.tools_used,
        steps = response.tool_executions.len(),
        "Query answered"
    );
    Ok(Json(response))
}

/// Returns the raw message trace. Kept for older clients.
pub async fn legacy(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LegacyQuery>,
) -> Result<Json<Vec<AgentMessage>>, AppError> {
    warn!("Deprecated endpoint called, use POST /internal_agent/query instead");

    let messages = state.agent.invoke(&params.query).await.map_err(|e| {
        error!("Agent execution failed: {:?}", e);
        AppError::from(e)
    })?;
    Ok(Json(messages))
}
