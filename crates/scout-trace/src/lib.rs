//! Typed execution traces reconstructed from agent message histories.
//!
//! An agent run yields an ordered list of heterogeneous messages. This crate
//! turns that list into something callers can consume without parsing prose:
//!
//! 1. [`normalize`] maps any message shape onto one [`Message`] record.
//! 2. [`extract_trace`] walks the records once and rebuilds the query, the
//!    tool executions, the final answer and token usage.
//! 3. [`decode_tool_result`] types each tool payload by its discriminator.
//!
//! None of these steps fail: missing or malformed pieces degrade to empty
//! defaults.

mod codec;
mod extract;
mod normalize;

pub use codec::{decode_tool_result, ParsedToolResult, ToolResult};
pub use extract::{extract_trace, ToolExecutionStep, ToolInvocation, TraceMetadata, TraceSummary};
pub use normalize::{normalize, normalize_value, Message, MessageContent, MessageKind, RawMessage};
