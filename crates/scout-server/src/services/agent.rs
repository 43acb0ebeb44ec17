//! Runs the agent and assembles the structured response.

use std::time::Instant;

use scout_engine::Agent;
use scout_trace::{extract_trace, normalize, Message};
use tracing::debug;

use crate::dto::AgentQueryResponse;
use crate::error::AppError;

/// Invokes the agent with `query` and turns its trace into a typed response.
/// Agent failure is the only error; everything after it degrades to defaults.
pub async fn answer(agent: &dyn Agent, query: &str) -> Result<AgentQueryResponse, AppError> {
    let started = Instant::now();

    let raw = agent.invoke(query).await?;
    let messages: Vec<Message> = raw.iter().map(|m| normalize(m)).collect();
    debug!(messages = messages.len(), "normalized agent trace");

    let mut trace = extract_trace(&messages);
    trace.metadata.execution_time_ms = Some(round_ms(started.elapsed().as_secs_f64() * 1000.0));

    Ok(trace.into())
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
