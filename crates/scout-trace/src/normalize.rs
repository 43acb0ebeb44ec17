//! Normalization of heterogeneous agent messages into [`Message`] records.

use scout_core::{AgentMessage, ToolCall, Usage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Role of a normalized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Human,
    Assistant,
    ToolResult,
    System,
    Unknown,
}

impl MessageKind {
    /// Maps a wire type name (`"human"`, `"ai"`, `"tool"`, ...) to a kind.
    pub fn from_type(message_type: &str) -> Self {
        match message_type {
            "human" | "user" => MessageKind::Human,
            "ai" | "assistant" => MessageKind::Assistant,
            "tool" => MessageKind::ToolResult,
            "system" => MessageKind::System,
            _ => MessageKind::Unknown,
        }
    }
}

/// Message payload: plain text, or structured data as produced by tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Structured(Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Renders the payload as text. Lists of text blocks are concatenated.
    pub fn to_text(&self) -> String {
        let value = match self {
            MessageContent::Text(s) => return s.clone(),
            MessageContent::Structured(value) => value,
        };
        if value.is_null() {
            return String::new();
        }

        let blocks: Vec<&str> = value
            .as_array()
            .map(|items| items.iter().filter_map(block_text).collect())
            .unwrap_or_default();
        match blocks.is_empty() {
            true => value.to_string(),
            false => blocks.concat(),
        }
    }
}

fn block_text(block: &Value) -> Option<&str> {
    match block {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("text").and_then(Value::as_str),
        _ => None,
    }
}

/// One step of a trace, independent of where the message came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    #[serde(default)]
    pub content: MessageContent,
    /// Tools requested by an assistant message, in request order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Producing tool, set on tool results only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Capabilities a source message may expose. Only the type and content are
/// expected on every message; the rest default to absent.
pub trait RawMessage {
    fn message_type(&self) -> Option<&str>;
    fn content(&self) -> Option<MessageContent>;

    fn name(&self) -> Option<&str> {
        None
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }

    fn tool_call_id(&self) -> Option<&str> {
        None
    }

    fn usage_metadata(&self) -> Option<Usage> {
        None
    }
}

/// Builds a [`Message`] from whatever `raw` exposes.
pub fn normalize<M: RawMessage + ?Sized>(raw: &M) -> Message {
    let kind = MessageKind::from_type(raw.message_type().unwrap_or("unknown"));
    let tool_name = match kind {
        MessageKind::ToolResult => raw.name().map(str::to_owned),
        _ => None,
    };

    Message {
        kind,
        content: raw.content().unwrap_or_default(),
        tool_calls: raw.tool_calls().unwrap_or_default(),
        tool_name,
        tool_call_id: raw.tool_call_id().map(str::to_owned),
        usage: raw.usage_metadata(),
    }
}

/// Normalizes a JSON message. Values already in [`Message`] shape pass through.
pub fn normalize_value(value: &Value) -> Message {
    if value.get("kind").is_some() {
        if let Ok(message) = Message::deserialize(value) {
            return message;
        }
    }
    normalize(value)
}

impl RawMessage for AgentMessage {
    fn message_type(&self) -> Option<&str> {
        Some(self.type_name())
    }

    fn content(&self) -> Option<MessageContent> {
        let content = match self {
            AgentMessage::System { content } | AgentMessage::Human { content } | AgentMessage::Ai { content, .. } => {
                MessageContent::Text(content.clone())
            }
            AgentMessage::Tool { content: Value::String(s), .. } => MessageContent::Text(s.clone()),
            AgentMessage::Tool { content, .. } => MessageContent::Structured(content.clone()),
        };
        Some(content)
    }

    fn name(&self) -> Option<&str> {
        match self {
            AgentMessage::Tool { name, .. } => Some(name),
            _ => None,
        }
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        match self {
            AgentMessage::Ai { tool_calls, .. } => Some(tool_calls.clone()),
            _ => None,
        }
    }

    fn tool_call_id(&self) -> Option<&str> {
        match self {
            AgentMessage::Tool { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }

    fn usage_metadata(&self) -> Option<Usage> {
        match self {
            AgentMessage::Ai { usage_metadata, .. } => *usage_metadata,
            _ => None,
        }
    }
}

impl RawMessage for Value {
    fn message_type(&self) -> Option<&str> {
        self.get("type").or_else(|| self.get("role")).and_then(Value::as_str)
    }

    fn content(&self) -> Option<MessageContent> {
        match self.get("content")? {
            Value::Null => None,
            Value::String(s) => Some(MessageContent::Text(s.clone())),
            other => Some(MessageContent::Structured(other.clone())),
        }
    }

    fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        let calls = self.get("tool_calls")?.as_array()?;
        Some(calls.iter().map(tool_call_from_value).collect())
    }

    fn tool_call_id(&self) -> Option<&str> {
        self.get("tool_call_id").and_then(Value::as_str)
    }

    fn usage_metadata(&self) -> Option<Usage> {
        let raw = self.get("usage_metadata").or_else(|| self.get("usage"))?;
        match Usage::deserialize(raw) {
            Ok(mut usage) => {
                if usage.total_tokens == 0 {
                    usage.total_tokens = usage.input_tokens.saturating_add(usage.output_tokens);
                }
                Some(usage)
            }
            Err(e) => {
                debug!(error = %e, "ignoring malformed usage metadata");
                None
            }
        }
    }
}

/// Accepts `{name, args, id}` as well as `{id, function: {name, arguments}}`
/// where `arguments` is JSON text.
fn tool_call_from_value(value: &Value) -> ToolCall {
    let function = value.get("function");
    let name = value
        .get("name")
        .or_else(|| function.and_then(|f| f.get("name")))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let raw_args = value
        .get("args")
        .or_else(|| value.get("arguments"))
        .or_else(|| function.and_then(|f| f.get("arguments")));
    let arguments = match raw_args {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(text)) => match serde_json::from_str(text) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    };

    let id = value.get("id").and_then(Value::as_str).map(str::to_owned);
    ToolCall { name, arguments, id }
}
