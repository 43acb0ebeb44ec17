//! OpenAI client built on `async-openai`.

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs, FunctionCall, FunctionObjectArgs,
    ResponseFormat, ResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;
use scout_config::ModelSettings;
use scout_core::{AgentError, AgentMessage, ToolCall, Usage};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{ChatModel, ChatTurn, Embedder, OutputSchema, ToolSchema};

/// Client for OpenAI chat completions and embeddings.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    embedding_model: String,
}

impl OpenAiClient {
    /// Creates a client. Without an explicit key the SDK falls back to `OPENAI_API_KEY`.
    pub fn new(settings: &ModelSettings) -> Self {
        let mut config = OpenAIConfig::new();
        if let Some(key) = &settings.api_key {
            config = config.with_api_key(key);
        }
        if let Some(base) = &settings.api_base {
            config = config.with_api_base(base);
        }
        tracing::info!(
            "OpenAiClient: model={}, embedding_model={}, api_base={}",
            settings.model,
            settings.embedding_model,
            settings.api_base.as_deref().unwrap_or("default")
        );
        Self {
            client: Client::with_config(config),
            model: settings.model.clone(),
            temperature: settings.temperature,
            embedding_model: settings.embedding_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

fn llm_error(e: OpenAIError) -> AgentError {
    AgentError::LlmError(e.to_string())
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(
        &self,
        system_prompt: &str,
        history: &[AgentMessage],
        tools: &[ToolSchema],
    ) -> Result<ChatTurn, AgentError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(system_message(system_prompt).map_err(llm_error)?);
        for msg in history {
            messages.push(to_request_message(msg).map_err(llm_error)?);
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if !tools.is_empty() {
            let tools = tools.iter().map(to_openai_tool).collect::<Result<Vec<_>, _>>().map_err(llm_error)?;
            args.tools(tools);
        }
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args.build().map_err(llm_error)?;

        let response = self.client.chat().create(request).await.map_err(llm_error)?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::LlmError("response contained no choices".into()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(from_openai_tool_call)
            .collect();
        let usage = response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        debug!(tool_calls = tool_calls.len(), "chat turn completed");
        Ok(ChatTurn { content: choice.message.content.unwrap_or_default(), tool_calls, usage })
    }

    async fn structured(
        &self,
        system_prompt: &str,
        user_input: &str,
        schema: &OutputSchema,
    ) -> Result<Value, AgentError> {
        let messages = vec![
            system_message(system_prompt).map_err(llm_error)?,
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_input)
                .build()
                .map_err(llm_error)?
                .into(),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages).response_format(ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: schema.description.clone(),
                name: schema.name.clone(),
                schema: Some(schema.schema.clone()),
                strict: Some(true),
            },
        });
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args.build().map_err(llm_error)?;

        let response = self.client.chat().create(request).await.map_err(llm_error)?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AgentError::ParseError(format!("empty reply for schema {}", schema.name)))?;

        serde_json::from_str(&content).map_err(|e| AgentError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AgentError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input(text.to_string())
            .build()
            .map_err(llm_error)?;

        let response = self.client.embeddings().create(request).await.map_err(llm_error)?;
        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AgentError::LlmError("no embedding data in response".into()))
    }
}

fn system_message(content: &str) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    Ok(ChatCompletionRequestSystemMessageArgs::default().content(content).build()?.into())
}

fn to_request_message(msg: &AgentMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let message = match msg {
        AgentMessage::System { content } => system_message(content)?,
        AgentMessage::Human { content } => {
            ChatCompletionRequestUserMessageArgs::default().content(content.as_str()).build()?.into()
        }
        AgentMessage::Ai { content, tool_calls, .. } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !content.is_empty() {
                args.content(content.as_str());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(tool_calls.iter().map(to_openai_tool_call).collect::<Vec<_>>());
            }
            args.build()?.into()
        }
        AgentMessage::Tool { content, tool_call_id, .. } => {
            let text = match content {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ChatCompletionRequestToolMessageArgs::default()
                .content(text)
                .tool_call_id(tool_call_id.as_str())
                .build()?
                .into()
        }
    };
    Ok(message)
}

fn to_openai_tool(tool: &ToolSchema) -> Result<ChatCompletionTool, OpenAIError> {
    ChatCompletionToolArgs::default()
        .r#type(ChatCompletionToolType::Function)
        .function(
            FunctionObjectArgs::default()
                .name(tool.name.as_str())
                .description(tool.description.as_str())
                .parameters(tool.parameters.clone())
                .build()?,
        )
        .build()
}

fn to_openai_tool_call(call: &ToolCall) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.id.clone().unwrap_or_default(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.name.clone(),
            arguments: Value::Object(call.arguments.clone()).to_string(),
        },
    }
}

fn from_openai_tool_call(call: ChatCompletionMessageToolCall) -> ToolCall {
    let arguments = match serde_json::from_str::<Value>(&call.function.arguments) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(tool = %call.function.name, "tool arguments are not an object: {}", other);
            Map::new()
        }
        Err(e) => {
            warn!(tool = %call.function.name, error = %e, "failed to parse tool arguments");
            Map::new()
        }
    };
    ToolCall { name: call.function.name, arguments, id: Some(call.id) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn openai_call(arguments: &str) -> ChatCompletionMessageToolCall {
        ChatCompletionMessageToolCall {
            id: "call_abc".into(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall { name: "search_internal_qa_tool".into(), arguments: arguments.into() },
        }
    }

    #[test]
    fn test_tool_call_conversion() {
        let call = from_openai_tool_call(openai_call(r#"{"query":"search bar"}"#));
        assert_eq!(call.name, "search_internal_qa_tool");
        assert_eq!(call.id.as_deref(), Some("call_abc"));
        assert_eq!(call.arguments["query"], "search bar");

        let back = to_openai_tool_call(&call);
        assert_eq!(back.id, "call_abc");
        let args: Value = serde_json::from_str(&back.function.arguments).unwrap();
        assert_eq!(args, json!({ "query": "search bar" }));
    }

    #[test]
    fn test_malformed_tool_arguments_become_empty() {
        assert!(from_openai_tool_call(openai_call("not json")).arguments.is_empty());
        assert!(from_openai_tool_call(openai_call("[1, 2]")).arguments.is_empty());
    }

    #[test]
    fn test_history_converts_every_message_kind() {
        let history = vec![
            AgentMessage::human("What about search?"),
            AgentMessage::ai_tool_calls(vec![ToolCall::new("search_internal_qa_tool", json!({ "query": "search" }))
                .with_id("call_1")]),
            AgentMessage::tool("search_internal_qa_tool", "call_1", json!({ "tool": "internal_qna" })),
            AgentMessage::ai("Here is X."),
        ];
        for msg in &history {
            assert!(to_request_message(msg).is_ok());
        }
    }
}
