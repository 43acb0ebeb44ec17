use scout_trace::{ToolExecutionStep, TraceMetadata, TraceSummary};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// === HTTP DTOs ===

#[derive(Debug, Deserialize)]
pub struct AgentQueryRequest {
    pub query: String,
}

impl AgentQueryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.query.is_empty() {
            return Err(AppError::Validation("query: must contain at least 1 character".into()));
        }
        Ok(())
    }
}

/// Structured answer to a query, reconstructed from the agent trace.
#[derive(Debug, Serialize)]
pub struct AgentQueryResponse {
    pub query: String,
    /// Distinct tool names, sorted.
    pub tools_used: Vec<String>,
    pub tool_executions: Vec<ToolExecutionStep>,
    pub final_answer: String,
    pub metadata: TraceMetadata,
}

impl From<TraceSummary> for AgentQueryResponse {
    fn from(trace: TraceSummary) -> Self {
        Self {
            query: trace.query,
            tools_used: trace.tools_used.into_iter().collect(),
            tool_executions: trace.tool_executions,
            final_answer: trace.final_answer,
            metadata: trace.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LegacyQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub service: &'static str,
}
