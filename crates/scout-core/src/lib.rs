//! Core domain types and error definitions for scout.
//!
//! This crate provides the fundamental types shared across the workspace:
//!
//! - [`AgentError`]: error type for agent, tool and LLM operations
//! - [`AgentMessage`]: one message of an agent run, in its native shape
//! - [`ToolCall`] and [`Usage`]: tool requests and token accounting
//! - [`payload`]: payloads returned by the built-in tools
//!
//! # Example
//!
//! ```rust
//! use scout_core::{AgentMessage, ToolCall};
//!
//! let call = ToolCall::new("search_internal_qa_tool", serde_json::json!({ "query": "search bar" }));
//! let trace = vec![
//!     AgentMessage::human("What did users say about the search bar?"),
//!     AgentMessage::ai_tool_calls(vec![call]),
//! ];
//! assert_eq!(trace.len(), 2);
//! ```

pub mod payload;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while running the agent or one of its tools.
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM API request failed.
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// Failed to parse structured output from LLM.
    #[error("Failed to parse structured output: {0}")]
    ParseError(String),

    /// A tool was called but could not complete.
    #[error("Tool execution failed: {0}")]
    ToolFailed(String),

    /// The model asked for a tool that is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Vector store request failed.
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// The agent loop ran out of turns before producing an answer.
    #[error("Agent stopped after {0} iterations without a final answer")]
    MaxIterations(usize),
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::ParseError(err.to_string())
    }
}

/// A request from the model to run a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// Arguments keyed by parameter name.
    #[serde(rename = "args", default)]
    pub arguments: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ToolCall {
    /// Creates a tool call without an id. Non-object arguments are dropped.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { name: name.into(), arguments, id: None }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Token accounting reported with a model turn. Missing or null counts read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, alias = "prompt_tokens", deserialize_with = "null_as_zero")]
    pub input_tokens: u32,
    #[serde(default, alias = "completion_tokens", deserialize_with = "null_as_zero")]
    pub output_tokens: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self { input_tokens, output_tokens, total_tokens: input_tokens.saturating_add(output_tokens) }
    }
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

/// One message produced during an agent run.
///
/// Serializes in the conventional chat-trace shape, e.g.
/// `{"type": "ai", "content": "...", "tool_calls": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AgentMessage {
    System {
        content: String,
    },
    Human {
        content: String,
    },
    Ai {
        #[serde(default)]
        content: String,
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage_metadata: Option<Usage>,
    },
    Tool {
        /// Structured tool output, or text when the tool failed.
        content: Value,
        name: String,
        tool_call_id: String,
    },
}

impl AgentMessage {
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human { content: content.into() }
    }

    /// Creates an assistant message carrying a plain reply.
    pub fn ai(content: impl Into<String>) -> Self {
        Self::Ai { content: content.into(), tool_calls: Vec::new(), usage_metadata: None }
    }

    /// Creates an assistant message that only dispatches tools.
    pub fn ai_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self::Ai { content: String::new(), tool_calls, usage_metadata: None }
    }

    pub fn tool(name: impl Into<String>, tool_call_id: impl Into<String>, content: Value) -> Self {
        Self::Tool { content, name: name.into(), tool_call_id: tool_call_id.into() }
    }

    /// Attaches token usage to an assistant message. Other kinds are returned unchanged.
    pub fn with_usage(self, usage: Usage) -> Self {
        match self {
            Self::Ai { content, tool_calls, .. } => {
                Self::Ai { content, tool_calls, usage_metadata: Some(usage) }
            }
            other => other,
        }
    }

    /// Wire name of this message's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "human",
            Self::Ai { .. } => "ai",
            Self::Tool { .. } => "tool",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agent_message_wire_shape() {
        let call = ToolCall::new("search_internal_qa_tool", json!({ "query": "search" })).with_id("call_1");
        let msg = AgentMessage::ai_tool_calls(vec![call]).with_usage(Usage::new(10, 5));

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "ai");
        assert_eq!(value["tool_calls"][0]["name"], "search_internal_qa_tool");
        assert_eq!(value["tool_calls"][0]["args"]["query"], "search");
        assert_eq!(value["tool_calls"][0]["id"], "call_1");
        assert_eq!(value["usage_metadata"]["total_tokens"], 15);
    }

    #[test]
    fn test_tool_call_drops_non_object_arguments() {
        let call = ToolCall::new("summarize_issues_tool", json!("raw text"));
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_usage_accepts_openai_field_names() {
        let usage: Usage =
            serde_json::from_value(json!({ "prompt_tokens": 7, "completion_tokens": 3, "total_tokens": 10 }))
                .unwrap();
        assert_eq!(usage, Usage { input_tokens: 7, output_tokens: 3, total_tokens: 10 });
    }

    #[test]
    fn test_usage_null_counts_read_as_zero() {
        let usage: Usage =
            serde_json::from_value(json!({ "input_tokens": 40, "output_tokens": null, "total_tokens": null }))
                .unwrap();
        assert_eq!(usage, Usage { input_tokens: 40, output_tokens: 0, total_tokens: 0 });
    }

    #[test]
    fn test_usage_total_saturates() {
        let usage = Usage::new(4_000_000_000, 400_000_000);
        assert_eq!(usage.total_tokens, u32::MAX);
    }

    #[test]
    fn test_with_usage_ignores_non_assistant_messages() {
        let msg = AgentMessage::human("hi").with_usage(Usage::new(1, 1));
        assert_eq!(msg, AgentMessage::human("hi"));
        assert_eq!(msg.type_name(), "human");
    }
}
