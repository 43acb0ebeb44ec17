//! Typed decoding of tool-result payloads.

use scout_core::payload::{QnaHit, Severity, INTERNAL_QNA, ISSUE_SUMMARY};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::normalize::MessageContent;

/// A tool payload, typed by its `tool` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool_type", rename_all = "snake_case")]
pub enum ToolResult {
    InternalQna {
        answer: String,
        hits: Vec<QnaHit>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rationale: Option<String>,
    },
    IssueSummary {
        /// The nested summary object as the tool returned it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<Map<String, Value>>,
        reported_issues: Vec<String>,
        affected_features: Vec<String>,
        #[serde(default)]
        severity: Option<Severity>,
    },
    /// Payload that was not JSON or carried no recognized discriminator.
    Unknown { raw_content: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedToolResult {
    pub tool_name: String,
    #[serde(flatten)]
    pub result: ToolResult,
}

/// Decodes the content of a tool-result message. Never fails: anything that
/// cannot be typed is kept verbatim as [`ToolResult::Unknown`].
pub fn decode_tool_result(tool_name: &str, content: &MessageContent) -> ParsedToolResult {
    let result = match content {
        MessageContent::Text(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => decode_payload(&value, text.clone()),
            Err(e) => {
                warn!(tool = tool_name, error = %e, "tool result is not JSON");
                ToolResult::Unknown { raw_content: text.clone() }
            }
        },
        MessageContent::Structured(value) => decode_payload(value, value.to_string()),
    };

    ParsedToolResult { tool_name: tool_name.to_string(), result }
}

fn decode_payload(value: &Value, raw_content: String) -> ToolResult {
    let decoded = match value.get("tool").and_then(Value::as_str) {
        Some(INTERNAL_QNA) => decode_qna(value),
        Some(ISSUE_SUMMARY) => decode_summary(value),
        _ => None,
    };
    decoded.unwrap_or(ToolResult::Unknown { raw_content })
}

/// Present and non-null.
fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

fn decode_qna(value: &Value) -> Option<ToolResult> {
    let answer = match field(value, "answer") {
        Some(v) => v.as_str()?.to_string(),
        None => String::new(),
    };
    let hits = match field(value, "hits") {
        Some(v) => v.as_array()?.iter().map(decode_hit).collect(),
        None => Vec::new(),
    };
    let rationale = field(value, "rationale").and_then(Value::as_str).map(str::to_owned);

    Some(ToolResult::InternalQna { answer, hits, rationale })
}

/// Keeps every hit as reported; absent parts default to empty.
fn decode_hit(item: &Value) -> QnaHit {
    let text = item.get("text").and_then(Value::as_str).unwrap_or_else(|| {
        debug!(hit = %item, "hit without text");
        ""
    });
    let score = item.get("score").and_then(Value::as_f64).unwrap_or(0.0);
    let metadata = item.get("metadata").and_then(Value::as_object).cloned().unwrap_or_default();

    QnaHit { text: text.to_string(), score, metadata }
}

fn decode_summary(value: &Value) -> Option<ToolResult> {
    let summary = field(value, "summary");
    if summary.is_some_and(|s| !s.is_object()) {
        return None;
    }

    let reported_issues = string_list(summary, "reported_issues")?;
    let affected_features = string_list(summary, "affected_features")?;
    let severity = match summary.and_then(|s| field(s, "severity")) {
        Some(v) => match v.as_str()?.parse::<Severity>() {
            Ok(severity) => Some(severity),
            Err(e) => {
                debug!("{}", e);
                None
            }
        },
        None => None,
    };

    Some(ToolResult::IssueSummary {
        summary: summary.and_then(Value::as_object).cloned(),
        reported_issues,
        affected_features,
        severity,
    })
}

fn string_list(parent: Option<&Value>, key: &str) -> Option<Vec<String>> {
    match parent.and_then(|p| field(p, key)) {
        Some(v) => v.as_array()?.iter().map(|item| item.as_str().map(str::to_owned)).collect(),
        None => Some(Vec::new()),
    }
}
