//! Issue summarization tool.

use std::sync::Arc;

use async_trait::async_trait;
use scout_core::payload::{IssueSummary, IssueSummaryResponse};
use scout_core::AgentError;
use scout_llm::{ChatModel, OutputSchema};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::prompts::SUMMARIZE_ISSUES_PROMPT;
use crate::{required_str, Tool};

const NAME: &str = "summarize_issues_tool";

/// Summarizes raw issue text into reported issues, affected features and severity.
pub struct SummarizeIssuesTool {
    model: Arc<dyn ChatModel>,
}

impl SummarizeIssuesTool {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn output_schema() -> OutputSchema {
        OutputSchema {
            name: "IssueSummary".into(),
            description: Some("Structured summary of reported issues".into()),
            schema: IssueSummary::json_schema(),
        }
    }
}

#[async_trait]
impl Tool for SummarizeIssuesTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Summarize reported issues with structured JSON (reported_issues, affected_features, severity)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "issue_text": { "type": "string", "description": "Raw bug reports or feedback to analyze" }
            },
            "required": ["issue_text"]
        })
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AgentError> {
        let issue_text = required_str(NAME, args, "issue_text")?;
        let user_input = format!("Analyze and summarize these issues:\n\n{}", issue_text);

        let raw = self
            .model
            .structured(SUMMARIZE_ISSUES_PROMPT, &user_input, &Self::output_schema())
            .await?;
        let summary: IssueSummary = serde_json::from_value(raw)?;
        info!("{}: {} issues, severity {}", NAME, summary.reported_issues.len(), summary.severity);

        let response = IssueSummaryResponse {
            rationale: "User provided raw issue text; summarized into structured fields.".into(),
            summary,
            evidence: None,
            suggested_fixes: None,
            confidence: None,
        };
        Ok(serde_json::to_value(response)?)
    }
}
