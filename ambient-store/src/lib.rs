//! Memory store client (C4, §4.4): an HTTP client for an external
//! mem0-like vector memory service. Grounded in the donor gateway's
//! proxy-client shape (`backend-rust-gateway/src/main.rs`'s
//! `AppState.http_client` plus per-route request building), but pointed at
//! the §6.C wire format instead of a sibling microservice.

use std::time::Duration;

use ambient_core::error::MemError;
use ambient_core::{Dialect, Memory, MemoryConfig, MemoryMetadata, SearchResult};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

pub struct MemoryStoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    user_id: String,
    collection_name: String,
    dialect: Dialect,
}

impl MemoryStoreClient {
    pub fn new(config: &MemoryConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
            .build()
            .expect("failed to build reqwest client");

        let api_key = if config.api_key.is_empty() {
            None
        } else {
            Some(config.api_key.clone())
        };

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            user_id: config.user_id.clone(),
            collection_name: config.collection_name.clone(),
            dialect: config.dialect,
        }
    }

    /// §4.4 "Invariants": the returned Memory's `id` matches the backend's
    /// assignment when present, otherwise empty.
    pub async fn add(&self, content: &str, metadata: &MemoryMetadata) -> Result<Memory, MemError> {
        let url = format!("{}/v1/memories/", self.base_url);

        let body = match self.dialect {
            Dialect::Message => json!({
                "messages": [{"role": "user", "content": content}],
                "user_id": self.user_id,
                "agent_id": self.collection_name,
                "metadata": metadata,
            }),
            Dialect::Content => json!({
                "content": content,
                "container_tag": self.collection_name,
                "metadata": metadata,
            }),
        };

        let response = self.execute(self.http.post(&url).json(&body)).await?;
        let value = parse_json_body(response).await?;
        let id = extract_str(&value, "id").unwrap_or_default();

        Ok(Memory {
            id,
            content: content.to_string(),
            user_id: self.user_id.clone(),
            metadata: metadata.clone(),
            created_at: Utc::now(),
        })
    }

    /// §4.4: ordered by non-increasing score, `[]` when the backend returns
    /// no results.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, MemError> {
        let url = format!("{}/v1/memories/search/", self.base_url);
        let body = json!({
            "query": query,
            "user_id": self.user_id,
            "agent_id": self.collection_name,
            "limit": limit,
        });

        let response = self.execute(self.http.post(&url).json(&body)).await?;
        let value = parse_json_body(response).await?;

        let items = unwrap_envelope(&value)?;
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(search_result_from_value(item, &self.user_id)?);
        }
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(results)
    }

    /// §4.4: most recent first, best-effort.
    pub async fn get_recent(&self, limit: usize) -> Result<Vec<Memory>, MemError> {
        let url = format!("{}/v1/memories/", self.base_url);
        let query = [
            ("user_id", self.user_id.as_str()),
            ("agent_id", self.collection_name.as_str()),
            ("container_tag", self.collection_name.as_str()),
            ("limit", &limit.to_string()),
        ];

        let response = self
            .execute(self.http.get(&url).query(&query))
            .await?;
        let value = parse_json_body(response).await?;

        let items = unwrap_envelope(&value)?;
        let mut memories = Vec::with_capacity(items.len());
        for item in items {
            memories.push(memory_from_value(item, &self.user_id)?);
        }
        Ok(memories)
    }

    pub async fn delete(&self, id: &str) -> Result<(), MemError> {
        let url = format!("{}/v1/memories/{}", self.base_url, id);
        self.execute(self.http.delete(&url)).await?;
        Ok(())
    }

    pub async fn health(&self) -> Result<(), MemError> {
        let url = format!("{}/health", self.base_url);
        self.execute(self.http.get(&url)).await?;
        Ok(())
    }

    async fn execute(&self, mut builder: reqwest::RequestBuilder) -> Result<reqwest::Response, MemError> {
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| MemError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

async fn parse_json_body(response: reqwest::Response) -> Result<Value, MemError> {
    response
        .json()
        .await
        .map_err(|e| MemError::BadShape(e.to_string()))
}

/// §4.4 "the client must tolerate both top-level lists and
/// `{"results":[...]}` envelopes".
fn unwrap_envelope(value: &Value) -> Result<Vec<&Value>, MemError> {
    if let Some(arr) = value.as_array() {
        return Ok(arr.iter().collect());
    }
    if let Some(arr) = value.get("results").and_then(Value::as_array) {
        return Ok(arr.iter().collect());
    }
    if value.is_null() {
        return Ok(Vec::new());
    }
    Err(MemError::BadShape(
        "expected a list or a {\"results\": [...]} envelope".to_string(),
    ))
}

fn extract_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn extract_metadata(item: &Value, fallback_content: &str) -> MemoryMetadata {
    item.get("metadata")
        .cloned()
        .and_then(|m| serde_json::from_value::<MemoryMetadata>(m).ok())
        .unwrap_or_else(|| {
            debug!(content = %fallback_content, "memory item missing usable metadata, using sentinel");
            MemoryMetadata {
                timestamp: Utc::now(),
                context: ambient_core::AnalysisResult::UNKNOWN_CONTEXT.to_string(),
                activities: Vec::new(),
                key_elements: Vec::new(),
                user_intent: ambient_core::AnalysisResult::UNKNOWN_CONTEXT.to_string(),
                display_num: 0,
            }
        })
}

fn memory_from_value(item: &Value, user_id: &str) -> Result<Memory, MemError> {
    let content = extract_str(item, "memory")
        .or_else(|| extract_str(item, "content"))
        .unwrap_or_default();
    let metadata = extract_metadata(item, &content);

    Ok(Memory {
        id: extract_str(item, "id").unwrap_or_default(),
        content,
        user_id: user_id.to_string(),
        metadata,
        created_at: item
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now),
    })
}

fn search_result_from_value(item: &Value, user_id: &str) -> Result<SearchResult, MemError> {
    let memory = memory_from_value(item, user_id)?;
    let score = item.get("score").and_then(Value::as_f64).unwrap_or(0.0);
    let distance = item.get("distance").and_then(Value::as_f64).unwrap_or(0.0);
    Ok(SearchResult {
        memory,
        score,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(base_url: String) -> MemoryConfig {
        MemoryConfig {
            base_url,
            ..Default::default()
        }
    }

    fn metadata() -> MemoryMetadata {
        MemoryMetadata {
            timestamp: Utc::now(),
            context: "editor".to_string(),
            activities: vec!["coding".to_string()],
            key_elements: vec![],
            user_intent: "build a feature".to_string(),
            display_num: 0,
        }
    }

    #[tokio::test]
    async fn add_uses_message_dialect_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/memories/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc-123"})))
            .mount(&server)
            .await;

        let client = MemoryStoreClient::new(&config_for(server.uri()));
        let memory = client.add("hello world", &metadata()).await.unwrap();
        assert_eq!(memory.id, "abc-123");
        assert_eq!(memory.content, "hello world");
    }

    #[tokio::test]
    async fn add_with_content_dialect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/memories/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let mut config = config_for(server.uri());
        config.dialect = Dialect::Content;
        let client = MemoryStoreClient::new(&config);
        let memory = client.add("hello world", &metadata()).await.unwrap();
        assert_eq!(memory.id, "");
    }

    #[tokio::test]
    async fn search_returns_empty_vec_not_null_on_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/memories/search/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
            .mount(&server)
            .await;

        let client = MemoryStoreClient::new(&config_for(server.uri()));
        let results = client.search("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_tolerates_results_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/memories/search/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": "1", "memory": "first", "score": 0.9, "distance": 0.1},
                    {"id": "2", "memory": "second", "score": 0.5, "distance": 0.4}
                ]
            })))
            .mount(&server)
            .await;

        let client = MemoryStoreClient::new(&config_for(server.uri()));
        let results = client.search("q", 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].memory.content, "first");
        assert_eq!(results[0].score, 0.9);
    }

    #[tokio::test]
    async fn search_tolerates_bare_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/memories/search/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "1", "memory": "only", "score": 0.7, "distance": 0.2}
            ])))
            .mount(&server)
            .await;

        let client = MemoryStoreClient::new(&config_for(server.uri()));
        let results = client.search("q", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.content, "only");
    }

    #[tokio::test]
    async fn search_sorts_by_non_increasing_score_regardless_of_backend_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/memories/search/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "1", "memory": "low", "score": 0.2, "distance": 0.8},
                {"id": "2", "memory": "high", "score": 0.9, "distance": 0.1},
                {"id": "3", "memory": "mid", "score": 0.5, "distance": 0.5}
            ])))
            .mount(&server)
            .await;

        let client = MemoryStoreClient::new(&config_for(server.uri()));
        let results = client.search("q", 5).await.unwrap();
        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
    }

    #[tokio::test]
    async fn health_maps_non_2xx_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = MemoryStoreClient::new(&config_for(server.uri()));
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, MemError::Status { status: 503, .. }));
    }
}
