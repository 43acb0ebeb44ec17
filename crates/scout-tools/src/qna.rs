//! Internal Q&A search tool.

use std::sync::Arc;

use async_trait::async_trait;
use scout_core::payload::{InternalQnaResponse, QnaHit};
use scout_core::AgentError;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::vector_store::VectorIndex;
use crate::{required_str, Tool};

const NAME: &str = "search_internal_qa_tool";
const KEY_POINTS: usize = 3;

/// Searches bug reports and user feedback and returns the top hits.
pub struct SearchInternalQaTool {
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    fallback_k: usize,
}

impl SearchInternalQaTool {
    pub fn new(index: Arc<dyn VectorIndex>, top_k: usize, fallback_k: usize) -> Self {
        Self { index, top_k, fallback_k }
    }

    /// Scored similarity search first; on failure an unscored keyword search.
    async fn retrieve(&self, query: &str) -> Result<Vec<QnaHit>, AgentError> {
        match self.index.search_with_scores(query, self.top_k).await {
            Ok(hits) => Ok(hits),
            Err(e) => {
                warn!("Scored search failed, falling back to keyword search: {}", e);
                let hits = self.index.search(query, self.fallback_k).await?;
                Ok(hits.into_iter().map(|h| QnaHit { score: 0.0, ..h }).collect())
            }
        }
    }
}

fn key_findings(query: &str, hits: &[QnaHit]) -> String {
    if hits.is_empty() {
        return "No relevant information found in internal docs.".to_string();
    }
    let points = hits
        .iter()
        .take(KEY_POINTS)
        .map(|h| format!("- {}", h.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Key findings for '{}':\n{}", query, points)
}

#[async_trait]
impl Tool for SearchInternalQaTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Search internal documents (bug reports & user feedback) and return structured hits."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to look for in the internal documents" }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AgentError> {
        let query = required_str(NAME, args, "query")?;
        let hits = self.retrieve(query).await?;
        info!("{}: {} hits for {:?}", NAME, hits.len(), query);

        let response = InternalQnaResponse {
            rationale: "User asked a retrieval-style question; returning top matches.".into(),
            answer: key_findings(query, &hits),
            hits,
        };
        Ok(serde_json::to_value(response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeIndex {
        scored_fails: bool,
        hits: Vec<QnaHit>,
        requested_k: AtomicUsize,
    }

    impl FakeIndex {
        fn new(scored_fails: bool, texts: &[&str]) -> Self {
            let hits = texts
                .iter()
                .map(|t| QnaHit { text: t.to_string(), score: 0.9, metadata: Map::new() })
                .collect();
            Self { scored_fails, hits, requested_k: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl VectorIndex for FakeIndex {
        async fn search_with_scores(&self, _query: &str, k: usize) -> Result<Vec<QnaHit>, AgentError> {
            self.requested_k.store(k, Ordering::SeqCst);
            match self.scored_fails {
                true => Err(AgentError::VectorStore("scores unavailable".into())),
                false => Ok(self.hits.iter().take(k).cloned().collect()),
            }
        }

        async fn search(&self, _query: &str, k: usize) -> Result<Vec<QnaHit>, AgentError> {
            self.requested_k.store(k, Ordering::SeqCst);
            Ok(self.hits.iter().take(k).cloned().collect())
        }
    }

    fn args(query: &str) -> Map<String, Value> {
        json!({ "query": query }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_scored_search_payload() {
        let index = Arc::new(FakeIndex::new(false, &["Feedback #48", "Bug #12", "Bug #28", "Feedback #2"]));
        let tool = SearchInternalQaTool::new(index.clone(), 5, 3);

        let value = tool.call(&args("search bar")).await.unwrap();
        assert_eq!(value["tool"], "internal_qna");
        assert_eq!(value["hits"].as_array().unwrap().len(), 4);
        assert_eq!(value["hits"][0]["score"], 0.9);
        assert_eq!(
            value["answer"],
            "Key findings for 'search bar':\n- Feedback #48\n- Bug #12\n- Bug #28"
        );
        assert_eq!(index.requested_k.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_falls_back_to_unscored_search() {
        let index = Arc::new(FakeIndex::new(true, &["a", "b", "c", "d"]));
        let tool = SearchInternalQaTool::new(index.clone(), 5, 3);

        let value = tool.call(&args("upload")).await.unwrap();
        let hits = value["hits"].as_array().unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h["score"] == 0.0));
        assert_eq!(index.requested_k.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_hits_answer() {
        let tool = SearchInternalQaTool::new(Arc::new(FakeIndex::new(false, &[])), 5, 3);
        let value = tool.call(&args("nothing")).await.unwrap();
        assert_eq!(value["answer"], "No relevant information found in internal docs.");
        assert_eq!(value["hits"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_query_is_an_error() {
        let tool = SearchInternalQaTool::new(Arc::new(FakeIndex::new(false, &[])), 5, 3);
        let err = tool.call(&Map::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolFailed(_)));
    }
}
