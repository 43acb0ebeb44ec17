//! Qdrant-backed document index.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use scout_config::VectorStoreSettings;
use scout_core::payload::QnaHit;
use scout_core::AgentError;
use scout_llm::Embedder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Similarity search over the internal documents.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top `k` hits with relevance scores in `0.0..=1.0`.
    async fn search_with_scores(&self, query: &str, k: usize) -> Result<Vec<QnaHit>, AgentError>;

    /// Up to `k` keyword matches without relevance scores; every score is `0.0`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<QnaHit>, AgentError>;
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Deserialize)]
struct ScrollPage {
    points: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

/// Client for one Qdrant collection whose points carry
/// `{"page_content": ..., "metadata": {...}}` payloads.
pub struct QdrantStore {
    http: Client,
    url: String,
    api_key: Option<String>,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl QdrantStore {
    /// Connects to the collection, creating it when it does not exist yet.
    ///
    /// The vector size is taken from an embedding of a sample text.
    pub async fn connect(
        settings: &VectorStoreSettings,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, AgentError> {
        let store = Self {
            http: Client::new(),
            url: settings.url.clone(),
            api_key: settings.api_key.clone(),
            collection: settings.collection.clone(),
            embedder,
        };

        let vector_size = store.embedder.embed("sample text").await?.len();
        let exists: ExistsResult = store
            .send(store.http.get(store.collection_url("/exists")))
            .await?;

        if !exists.exists {
            info!("Creating Qdrant collection {} (size {})", store.collection, vector_size);
            let body = json!({ "vectors": { "size": vector_size, "distance": "Cosine" } });
            let _: Value = store.send(store.http.put(store.collection_url("")).json(&body)).await?;
        }

        info!("Vector store ready: {}/{}", store.url, store.collection);
        Ok(store)
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.url, self.collection, suffix)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AgentError> {
        let request = match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        };

        let response = request.send().await.map_err(|e| AgentError::VectorStore(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::VectorStore(format!("Qdrant error {}: {}", status, body)));
        }

        let parsed: QdrantResponse<T> =
            response.json().await.map_err(|e| AgentError::VectorStore(e.to_string()))?;
        Ok(parsed.result)
    }

    async fn nearest(&self, query: &str, k: usize) -> Result<Vec<ScoredPoint>, AgentError> {
        let vector = self.embedder.embed(query).await?;
        let body = json!({ "vector": vector, "limit": k, "with_payload": true });
        let points: Vec<ScoredPoint> =
            self.send(self.http.post(self.collection_url("/points/search")).json(&body)).await?;
        debug!(collection = %self.collection, hits = points.len(), "similarity search");
        Ok(points)
    }

    /// Scrolls points whose `page_content` contains any query keyword. Needs
    /// no embedding, so it still answers when the embedding service is down.
    async fn keyword_scan(&self, query: &str, k: usize) -> Result<Vec<ScoredPoint>, AgentError> {
        let mut body = json!({ "limit": k, "with_payload": true, "with_vector": false });
        if let Some(filter) = keyword_filter(query) {
            body["filter"] = filter;
        }
        let page: ScrollPage =
            self.send(self.http.post(self.collection_url("/points/scroll")).json(&body)).await?;
        debug!(collection = %self.collection, hits = page.points.len(), "keyword scan");
        Ok(page.points)
    }
}

const MIN_KEYWORD_CHARS: usize = 3;

/// `should` filter over the distinct words of `query`; `None` when no word is long enough.
fn keyword_filter(query: &str) -> Option<Value> {
    let mut words: Vec<&str> = query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() >= MIN_KEYWORD_CHARS)
        .collect();
    words.sort_unstable();
    words.dedup();
    if words.is_empty() {
        return None;
    }

    let should: Vec<Value> = words
        .into_iter()
        .map(|w| json!({ "key": "page_content", "match": { "text": w } }))
        .collect();
    Some(json!({ "should": should }))
}

fn hit_from_point(point: ScoredPoint, with_score: bool) -> QnaHit {
    let mut payload = point.payload.unwrap_or_default();
    let text = match payload.remove("page_content") {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let metadata = match payload.remove("metadata") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let score = match with_score {
        true => point.score.clamp(0.0, 1.0),
        false => 0.0,
    };
    QnaHit { text, score, metadata }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn search_with_scores(&self, query: &str, k: usize) -> Result<Vec<QnaHit>, AgentError> {
        let points = self.nearest(query, k).await?;
        Ok(points.into_iter().map(|p| hit_from_point(p, true)).collect())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<QnaHit>, AgentError> {
        let points = self.keyword_scan(query, k).await?;
        Ok(points.into_iter().map(|p| hit_from_point(p, false)).collect())
    }
}

static SHARED_STORE: OnceCell<Arc<QdrantStore>> = OnceCell::const_new();

/// Process-wide [`QdrantStore`] that connects on the first search.
///
/// A failed connection is reported to that caller and attempted again on the
/// next search.
pub struct LazyVectorStore {
    settings: VectorStoreSettings,
    embedder: Arc<dyn Embedder>,
}

impl LazyVectorStore {
    pub fn new(settings: VectorStoreSettings, embedder: Arc<dyn Embedder>) -> Self {
        Self { settings, embedder }
    }

    async fn store(&self) -> Result<Arc<QdrantStore>, AgentError> {
        SHARED_STORE
            .get_or_try_init(|| async {
                QdrantStore::connect(&self.settings, self.embedder.clone()).await.map(Arc::new)
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl VectorIndex for LazyVectorStore {
    async fn search_with_scores(&self, query: &str, k: usize) -> Result<Vec<QnaHit>, AgentError> {
        self.store().await?.search_with_scores(query, k).await
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<QnaHit>, AgentError> {
        self.store().await?.search(query, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(value: Value) -> ScoredPoint {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_hit_from_point() {
        let p = point(json!({
            "id": 1,
            "score": 0.89,
            "payload": {
                "page_content": "Feedback #48: I got blocked from searching",
                "metadata": { "source": "ai_test_user_feedback.txt" }
            }
        }));
        let hit = hit_from_point(p, true);
        assert_eq!(hit.text, "Feedback #48: I got blocked from searching");
        assert!((hit.score - 0.89).abs() < 1e-9);
        assert_eq!(hit.metadata["source"], "ai_test_user_feedback.txt");
    }

    #[test]
    fn test_scores_are_clamped_or_dropped() {
        let over = point(json!({ "score": 1.3, "payload": { "page_content": "a" } }));
        assert_eq!(hit_from_point(over, true).score, 1.0);

        let under = point(json!({ "score": -0.2, "payload": null }));
        let hit = hit_from_point(under, true);
        assert_eq!(hit.score, 0.0);
        assert_eq!(hit.text, "");

        let unscored = point(json!({ "score": 0.7, "payload": { "page_content": "b" } }));
        assert_eq!(hit_from_point(unscored, false).score, 0.0);
    }

    #[test]
    fn test_keyword_filter() {
        let filter = keyword_filter("What about the search bar? search!").unwrap();
        let words: Vec<&str> = filter["should"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["match"]["text"].as_str().unwrap())
            .collect();
        assert_eq!(words, vec!["What", "about", "bar", "search", "the"]);
        assert_eq!(filter["should"][0]["key"], "page_content");

        assert!(keyword_filter("a ok ?").is_none());
    }

    #[test]
    fn test_scroll_page_points_have_no_score() {
        let parsed: QdrantResponse<ScrollPage> = serde_json::from_value(json!({
            "result": {
                "points": [{ "id": 7, "payload": { "page_content": "Bug #12", "metadata": {} } }],
                "next_page_offset": null
            }
        }))
        .unwrap();
        let hit = hit_from_point(parsed.result.points.into_iter().next().unwrap(), false);
        assert_eq!(hit.text, "Bug #12");
        assert_eq!(hit.score, 0.0);
    }

    #[test]
    fn test_qdrant_envelope() {
        let parsed: QdrantResponse<ExistsResult> =
            serde_json::from_value(json!({ "result": { "exists": false }, "status": "ok", "time": 0.001 }))
                .unwrap();
        assert!(!parsed.result.exists);
    }
}
