//! Internal insights agent over bug reports and user feedback.
//!
//! A tool-calling agent searches a Qdrant collection and summarizes issues;
//! its message trace is then rebuilt into typed tool executions.
//!
//! ```no_run
//! use scout::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let agent = build_internal_agent(&settings).await;
//!
//! let raw = agent.invoke("What are users saying about search?").await?;
//! let messages: Vec<Message> = raw.iter().map(|m| normalize(m)).collect();
//! let trace = extract_trace(&messages);
//! println!("{}", trace.final_answer);
//! # Ok(())
//! # }
//! ```

pub use scout_config as config;
pub use scout_engine as engine;
pub use scout_llm as llm;
pub use scout_tools as tools;
pub use scout_trace as trace;

pub mod prelude {
    pub use scout_config::{ConfigError, Settings};
    pub use scout_core::payload::{Evidence, InternalQnaResponse, IssueSummary, IssueSummaryResponse, QnaHit, Severity};
    pub use scout_core::{AgentError, AgentMessage, ToolCall, Usage};
    pub use scout_engine::{build_internal_agent, Agent, ToolCallingAgent};
    pub use scout_llm::{ChatModel, Embedder, OpenAiClient};
    pub use scout_tools::{Tool, ToolRegistry};
    pub use scout_trace::{
        decode_tool_result, extract_trace, normalize, normalize_value, Message, MessageContent, MessageKind,
        ParsedToolResult, RawMessage, ToolExecutionStep, ToolResult, TraceSummary,
    };
}
