use std::collections::BTreeSet;

use scout_core::Usage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::codec::{decode_tool_result, ParsedToolResult};
use crate::normalize::{Message, MessageKind};

/// A tool call as requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

/// One requested tool call and, when one was found, its typed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionStep {
    /// 1-based position across the whole trace.
    #[serde(rename = "step")]
    pub step_index: usize,
    pub tool_call: ToolInvocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ParsedToolResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
}

impl From<Usage> for TraceMetadata {
    fn from(usage: Usage) -> Self {
        Self {
            input_tokens: Some(usage.input_tokens),
            output_tokens: Some(usage.output_tokens),
            total_tokens: Some(usage.total_tokens),
            execution_time_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub query: String,
    pub tools_used: BTreeSet<String>,
    pub tool_executions: Vec<ToolExecutionStep>,
    pub final_answer: String,
    pub metadata: TraceMetadata,
}

/// Rebuilds the query, tool executions, final answer and token usage from a
/// normalized trace.
///
/// Each tool call is paired with the nearest later tool result of the same
/// name that no earlier call has claimed. Calls without a result still
/// produce a step.
pub fn extract_trace(messages: &[Message]) -> TraceSummary {
    let query = messages
        .iter()
        .find(|m| m.kind == MessageKind::Human)
        .map(|m| m.content.to_text())
        .unwrap_or_default();

    let final_answer = messages
        .iter()
        .rev()
        .find(|m| m.kind == MessageKind::Assistant && m.tool_calls.is_empty())
        .map(|m| m.content.to_text())
        .unwrap_or_default();

    let metadata = messages
        .iter()
        .rev()
        .filter(|m| m.kind == MessageKind::Assistant)
        .find_map(|m| m.usage)
        .map(TraceMetadata::from)
        .unwrap_or_default();

    let mut consumed = vec![false; messages.len()];
    let mut tool_executions = Vec::new();
    let mut tools_used = BTreeSet::new();

    for (position, message) in messages.iter().enumerate() {
        if message.kind != MessageKind::Assistant {
            continue;
        }
        for call in &message.tool_calls {
            let matched = messages
                .iter()
                .enumerate()
                .skip(position + 1)
                .find(|(i, m)| {
                    !consumed[*i]
                        && m.kind == MessageKind::ToolResult
                        && m.tool_name.as_deref() == Some(call.name.as_str())
                });

            let tool_result = matched.map(|(i, m)| {
                consumed[i] = true;
                decode_tool_result(&call.name, &m.content)
            });
            if tool_result.is_none() {
                debug!(tool = %call.name, "no tool result for call");
            }

            if !call.name.is_empty() {
                tools_used.insert(call.name.clone());
            }
            tool_executions.push(ToolExecutionStep {
                step_index: tool_executions.len() + 1,
                tool_call: ToolInvocation { tool_name: call.name.clone(), arguments: call.arguments.clone() },
                tool_result,
            });
        }
    }

    TraceSummary { query, tools_used, tool_executions, final_answer, metadata }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ToolResult;
    use crate::normalize::{normalize_value, MessageContent};
    use scout_core::ToolCall;
    use serde_json::json;

    fn human(text: &str) -> Message {
        normalize_value(&json!({ "type": "human", "content": text }))
    }

    fn assistant(text: &str) -> Message {
        normalize_value(&json!({ "type": "ai", "content": text }))
    }

    fn dispatch(names: &[&str]) -> Message {
        let mut msg = assistant("");
        msg.tool_calls = names.iter().map(|n| ToolCall::new(*n, json!({ "query": "q" }))).collect();
        msg
    }

    fn tool_result(name: &str, content: &str) -> Message {
        normalize_value(&json!({ "type": "tool", "name": name, "content": content }))
    }

    fn qna(answer: &str) -> String {
        json!({ "tool": "internal_qna", "answer": answer, "hits": [] }).to_string()
    }

    fn answer_of(step: &ToolExecutionStep) -> Option<&str> {
        match &step.tool_result.as_ref()?.result {
            ToolResult::InternalQna { answer, .. } => Some(answer),
            _ => None,
        }
    }

    #[test]
    fn test_search_scenario() {
        let mut call = dispatch(&[]);
        call.tool_calls = vec![ToolCall::new("search_internal_qa_tool", json!({ "query": "search" }))];
        let messages = vec![
            human("What about search?"),
            call,
            tool_result("search_internal_qa_tool", r#"{"tool":"internal_qna","answer":"found X","hits":[]}"#),
            assistant("Here is X."),
        ];

        let trace = extract_trace(&messages);
        assert_eq!(trace.query, "What about search?");
        assert_eq!(trace.tools_used.iter().collect::<Vec<_>>(), vec!["search_internal_qa_tool"]);
        assert_eq!(trace.tool_executions.len(), 1);
        assert_eq!(trace.tool_executions[0].step_index, 1);
        assert_eq!(trace.tool_executions[0].tool_call.arguments["query"], "search");
        assert_eq!(answer_of(&trace.tool_executions[0]), Some("found X"));
        assert_eq!(trace.final_answer, "Here is X.");
    }

    #[test]
    fn test_one_step_per_call_even_without_results() {
        let messages = vec![
            human("q"),
            dispatch(&["a", "b"]),
            tool_result("a", &qna("first")),
            dispatch(&["c"]),
            assistant("done"),
        ];

        let trace = extract_trace(&messages);
        assert_eq!(trace.tool_executions.len(), 3);
        let indices: Vec<usize> = trace.tool_executions.iter().map(|s| s.step_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(trace.tool_executions[0].tool_result.is_some());
        assert!(trace.tool_executions[1].tool_result.is_none());
        assert!(trace.tool_executions[2].tool_result.is_none());
        assert_eq!(trace.tools_used.len(), 3);
    }

    #[test]
    fn test_repeated_tool_matches_each_result_once() {
        let messages = vec![
            human("q"),
            dispatch(&["search", "search"]),
            tool_result("search", &qna("one")),
            tool_result("search", &qna("two")),
            dispatch(&["search"]),
            tool_result("search", &qna("three")),
            assistant("done"),
        ];

        let trace = extract_trace(&messages);
        let answers: Vec<Option<&str>> = trace.tool_executions.iter().map(answer_of).collect();
        assert_eq!(answers, vec![Some("one"), Some("two"), Some("three")]);
        assert_eq!(trace.tools_used.len(), 1);
    }

    #[test]
    fn test_results_before_the_call_are_ignored() {
        let messages = vec![tool_result("search", &qna("stale")), dispatch(&["search"])];
        let trace = extract_trace(&messages);
        assert!(trace.tool_executions[0].tool_result.is_none());
    }

    #[test]
    fn test_no_human_message() {
        let trace = extract_trace(&[assistant("hello")]);
        assert_eq!(trace.query, "");
        assert_eq!(trace.final_answer, "hello");

        let empty = extract_trace(&[]);
        assert_eq!(empty, TraceSummary::default());
    }

    #[test]
    fn test_final_answer_skips_trailing_dispatch() {
        let messages = vec![human("q"), assistant("earlier answer"), dispatch(&["search"])];
        let trace = extract_trace(&messages);
        assert_eq!(trace.final_answer, "earlier answer");
    }

    #[test]
    fn test_metadata_from_last_assistant_with_usage() {
        let mut first = dispatch(&["search"]);
        first.usage = Some(Usage::new(100, 10));
        let mut last = assistant("done");
        last.usage = Some(Usage::new(250, 40));
        let trace = extract_trace(&[human("q"), first, tool_result("search", &qna("x")), last, assistant("")]);

        assert_eq!(trace.metadata.input_tokens, Some(250));
        assert_eq!(trace.metadata.output_tokens, Some(40));
        assert_eq!(trace.metadata.total_tokens, Some(290));
        assert_eq!(trace.metadata.execution_time_ms, None);

        let bare = extract_trace(&[human("q"), assistant("a")]);
        assert_eq!(bare.metadata, TraceMetadata::default());
    }

    #[test]
    fn test_unnamed_calls_are_not_listed() {
        let trace = extract_trace(&[dispatch(&[""])]);
        assert_eq!(trace.tool_executions.len(), 1);
        assert!(trace.tools_used.is_empty());
    }

    #[test]
    fn test_structured_tool_content() {
        let mut result = tool_result("summarize_issues_tool", "");
        result.content = MessageContent::Structured(json!({
            "tool": "issue_summary",
            "summary": { "reported_issues": ["crash"], "affected_features": [], "severity": "High" }
        }));
        let trace = extract_trace(&[dispatch(&["summarize_issues_tool"]), result]);

        let parsed = trace.tool_executions[0].tool_result.as_ref().unwrap();
        assert_eq!(parsed.tool_name, "summarize_issues_tool");
        assert!(matches!(parsed.result, ToolResult::IssueSummary { .. }));
    }

    #[test]
    fn test_step_serializes_as_step() {
        let trace = extract_trace(&[dispatch(&["search"])]);
        let value = serde_json::to_value(&trace.tool_executions[0]).unwrap();
        assert_eq!(value["step"], 1);
        assert_eq!(value["tool_call"]["tool_name"], "search");
        assert!(!value.as_object().unwrap().contains_key("tool_result"));
    }
}
