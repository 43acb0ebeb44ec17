//! LLM provider abstraction for scout.
//!
//! The agent and the tools talk to models through two traits:
//!
//! - [`ChatModel`]: tool-calling chat turns and schema-constrained output
//! - [`Embedder`]: text embeddings for vector search
//!
//! [`OpenAiClient`] implements both. [`shared_client`] hands out one
//! process-wide instance, built on first use.

mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use scout_config::ModelSettings;
use scout_core::{AgentError, AgentMessage, ToolCall, Usage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;

pub use openai::OpenAiClient;

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool's arguments object.
    pub parameters: Value,
}

/// JSON schema the model's reply must conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub description: Option<String>,
    pub schema: Value,
}

/// One assistant turn returned by [`ChatModel::chat`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
}

impl ChatTurn {
    /// Converts the turn into the assistant message recorded in the trace.
    pub fn into_message(self) -> AgentMessage {
        AgentMessage::Ai { content: self.content, tool_calls: self.tool_calls, usage_metadata: self.usage }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Runs one chat turn over `history`, offering `tools` to the model.
    async fn chat(
        &self,
        system_prompt: &str,
        history: &[AgentMessage],
        tools: &[ToolSchema],
    ) -> Result<ChatTurn, AgentError>;

    /// Asks for a single reply conforming to `schema` and returns it parsed.
    async fn structured(
        &self,
        system_prompt: &str,
        user_input: &str,
        schema: &OutputSchema,
    ) -> Result<Value, AgentError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AgentError>;
}

static SHARED_CLIENT: OnceCell<Arc<OpenAiClient>> = OnceCell::const_new();

/// Returns the process-wide OpenAI client, constructing it on the first call.
///
/// `settings` only matter for that first call; later calls return the same
/// instance.
pub async fn shared_client(settings: &ModelSettings) -> Arc<OpenAiClient> {
    SHARED_CLIENT
        .get_or_init(|| async { Arc::new(OpenAiClient::new(settings)) })
        .await
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(model: &str) -> ModelSettings {
        ModelSettings {
            api_key: Some("sk-test".into()),
            api_base: None,
            model: model.into(),
            temperature: None,
            embedding_model: "text-embedding-3-small".into(),
        }
    }

    #[tokio::test]
    async fn test_shared_client_is_constructed_once() {
        let first = shared_client(&settings("gpt-5-mini")).await;
        let second = shared_client(&settings("some-other-model")).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.model(), "gpt-5-mini");
    }

    #[test]
    fn test_turn_into_message() {
        let turn = ChatTurn {
            content: String::new(),
            tool_calls: vec![ToolCall::new("search_internal_qa_tool", json!({ "query": "upload" }))],
            usage: Some(Usage::new(12, 4)),
        };
        let AgentMessage::Ai { tool_calls, usage_metadata, .. } = turn.into_message() else {
            panic!("expected assistant message");
        };
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(usage_metadata.map(|u| u.total_tokens), Some(16));
    }
}
