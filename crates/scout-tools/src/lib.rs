//! Tool registry and built-in tools for scout.
//!
//! - [`SearchInternalQaTool`]: similarity search over the internal documents
//! - [`SummarizeIssuesTool`]: structured summary of raw issue text
//!
//! Tools return JSON payloads tagged with a `tool` discriminator (see
//! [`scout_core::payload`]).

mod prompts;
mod qna;
mod summary;
pub mod vector_store;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use scout_core::AgentError;
use scout_llm::ToolSchema;
use serde_json::{Map, Value};

pub use prompts::SUMMARIZE_ISSUES_PROMPT;
pub use qna::SearchInternalQaTool;
pub use summary::SummarizeIssuesTool;
pub use vector_store::{LazyVectorStore, QdrantStore, VectorIndex};

/// A callable tool the agent can dispatch to.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AgentError>;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Tools keyed by name. Schemas are listed in registration order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.order.iter().filter_map(|n| self.tools.get(n)).map(|t| t.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Reads a required string argument.
pub(crate) fn required_str<'a>(
    tool: &str,
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a str, AgentError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::ToolFailed(format!("{tool}: missing string argument '{key}'")))
}
