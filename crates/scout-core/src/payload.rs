//! Payloads returned by the built-in tools.
//!
//! Every payload carries a `tool` discriminator so consumers can tell the
//! shapes apart without knowing which tool produced them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator value of [`InternalQnaResponse`].
pub const INTERNAL_QNA: &str = "internal_qna";
/// Discriminator value of [`IssueSummaryResponse`].
pub const ISSUE_SUMMARY: &str = "issue_summary";

/// A retrieved document chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QnaHit {
    pub text: String,
    /// Similarity in `0.0..=1.0`; zero when the search ran without scores.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Output of the internal Q&A search tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename = "internal_qna")]
pub struct InternalQnaResponse {
    pub rationale: String,
    pub answer: String,
    pub hits: Vec<QnaHit>,
}

/// Impact level of a set of reported issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; unknown levels are rejected.
impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Structured summary of reported issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub reported_issues: Vec<String>,
    pub affected_features: Vec<String>,
    pub severity: Severity,
}

impl IssueSummary {
    /// JSON schema used to request this shape from the model in strict mode.
    pub fn json_schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reported_issues": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "List of reported issues"
                },
                "affected_features": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Features/components affected"
                },
                "severity": {
                    "type": "string",
                    "enum": ["Low", "Medium", "High", "Critical"],
                    "description": "Severity level: Low, Medium, High, Critical"
                }
            },
            "required": ["reported_issues", "affected_features", "severity"],
            "additionalProperties": false
        })
    }
}

/// Kind of document a piece of evidence was taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSource {
    Bug,
    Feedback,
    #[default]
    Other,
}

/// Part of a bug report a snippet comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    TitleDesc,
    Steps,
    Environment,
    Severity,
    Fix,
}

/// A document excerpt backing a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub source: EvidenceSource,
    #[serde(default)]
    pub bug_id: Option<u32>,
    #[serde(default)]
    pub feedback_id: Option<u32>,
    #[serde(default)]
    pub section: Option<ReportSection>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Output of the issue summarization tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename = "issue_summary")]
pub struct IssueSummaryResponse {
    pub rationale: String,
    pub summary: IssueSummary,
    #[serde(default)]
    pub evidence: Option<Vec<Evidence>>,
    #[serde(default)]
    pub suggested_fixes: Option<Vec<String>>,
    #[serde(default)]
    pub confidence: Option<f64>,
}
