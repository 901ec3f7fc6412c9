use super::{validate_query, SearchProvider};
use crate::error::{Result, StudyBoltError};
use crate::types::SearchResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const SERVICE: &str = "serpapi";

/// SerpAPI web search client.
pub struct SerpApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    engine: String,
    timeout: Duration,
}

impl SerpApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        engine: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            engine: engine.into(),
            timeout,
        })
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        validate_query(query, limit)?;

        let url = format!("{}/search", self.base_url);
        let num = limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
                ("engine", self.engine.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StudyBoltError::from_transport(SERVICE, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudyBoltError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|e| StudyBoltError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;

        let organic = body
            .get("organic_results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let results = normalize_results(organic, limit);
        log::debug!("serpapi returned {} results for {:?}", results.len(), query);
        Ok(results)
    }
}

/// Map raw provider records to [`SearchResult`]s, keeping the first `limit`.
///
/// Missing or non-string `title`, `snippet` and `link` fields become empty
/// strings. Ranks are 1-indexed in input order.
pub fn normalize_results(records: &[Value], limit: usize) -> Vec<SearchResult> {
    records
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, record)| {
            let field = |name: &str| {
                record
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            SearchResult::new(idx + 1, field("title"), field("snippet"), field("link"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_fills_missing_fields() {
        let records = vec![
            json!({"title": "Mitosis - Wikipedia", "snippet": "Cell division", "link": "https://en.wikipedia.org/wiki/Mitosis"}),
            json!({"link": "https://example.org"}),
            json!({"title": 42, "snippet": null}),
        ];

        let results = normalize_results(&records, 5);
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].id, "search-result-1");
        assert_eq!(results[0].title, "Mitosis - Wikipedia");

        assert_eq!(results[1].id, "search-result-2");
        assert_eq!(results[1].title, "");
        assert_eq!(results[1].snippet, "");
        assert_eq!(results[1].link, "https://example.org");

        assert_eq!(results[2].title, "");
        assert_eq!(results[2].link, "");
    }

    #[test]
    fn normalize_respects_limit() {
        let records: Vec<Value> = (0..10)
            .map(|i| json!({"title": format!("t{}", i)}))
            .collect();

        let results = normalize_results(&records, 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].title, "t2");
        assert_eq!(results[2].id, "search-result-3");
    }
}
