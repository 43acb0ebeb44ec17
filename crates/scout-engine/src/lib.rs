use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use scout_config::Settings;
use scout_core::{AgentError, AgentMessage, ToolCall};
use scout_llm::{shared_client, ChatModel, Embedder};
use scout_tools::{LazyVectorStore, SearchInternalQaTool, SummarizeIssuesTool, ToolRegistry};
use serde_json::Value;
use tracing::{debug, info, warn};

mod prompt;

pub use prompt::INTERNAL_AGENT_PROMPT;

const DEFAULT_MAX_ITERATIONS: usize = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────────────────────────────────────

/// Runs one query to completion and returns the full message trace.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn invoke(&self, query: &str) -> Result<Vec<AgentMessage>, AgentError>;
}

/// Agent that alternates model turns with tool execution until the model
/// replies without requesting tools.
///
/// The trace starts with the human query; the system prompt is sent to the
/// model but not recorded.
pub struct ToolCallingAgent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    system_prompt: String,
    max_iterations: usize,
}

impl ToolCallingAgent {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Executes one call. Failures become an error text the model can read.
    async fn run_tool(&self, call: &ToolCall) -> AgentMessage {
        let id = call.id.clone().unwrap_or_default();
        let Some(tool) = self.tools.get(&call.name) else {
            let err = AgentError::UnknownTool(call.name.clone());
            warn!("{}", err);
            return AgentMessage::tool(&call.name, id, Value::String(format!("Error: {}", err)));
        };

        match tool.call(&call.arguments).await {
            Ok(content) => AgentMessage::tool(&call.name, id, content),
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                AgentMessage::tool(&call.name, id, Value::String(format!("Error: {}", e)))
            }
        }
    }
}

#[async_trait]
impl Agent for ToolCallingAgent {
    async fn invoke(&self, query: &str) -> Result<Vec<AgentMessage>, AgentError> {
        let schemas = self.tools.schemas();
        let mut messages = vec![AgentMessage::human(query)];

        for iteration in 1..=self.max_iterations {
            let turn = self.model.chat(&self.system_prompt, &messages, &schemas).await?;
            let calls = turn.tool_calls.clone();
            debug!(iteration, tool_calls = calls.len(), "agent turn");
            messages.push(turn.into_message());

            if calls.is_empty() {
                info!("Agent finished after {} turn(s)", iteration);
                return Ok(messages);
            }

            let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
            info!("Running tools: {:?}", names);
            let results = join_all(calls.iter().map(|c| self.run_tool(c))).await;
            messages.extend(results);
        }

        Err(AgentError::MaxIterations(self.max_iterations))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the internal insights agent: the shared OpenAI client, the lazily
/// connected vector store, and both built-in tools.
pub async fn build_internal_agent(settings: &Settings) -> ToolCallingAgent {
    let client = shared_client(&settings.model).await;
    let embedder: Arc<dyn Embedder> = client.clone();
    let model: Arc<dyn ChatModel> = client;

    let index = Arc::new(LazyVectorStore::new(settings.vector_store.clone(), embedder));
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(SearchInternalQaTool::new(
        index,
        settings.vector_store.top_k,
        settings.vector_store.fallback_k,
    )));
    tools.register(Arc::new(SummarizeIssuesTool::new(model.clone())));
    info!("Registered tools: {:?}", tools.names());

    ToolCallingAgent::new(model, tools, INTERNAL_AGENT_PROMPT)
        .with_max_iterations(settings.agent.max_iterations)
}
