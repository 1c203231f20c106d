//! Web search tool
//!
//! Queries the Serper Google Search API and returns ranked organic results.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{create_http_client, HttpConfig, WebError};

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

/// A ranked web search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// 1-based rank in the provider's result list
    pub position: usize,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Capability: search the web for a query
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, WebError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Thread-safe reference to a search tool
pub type SharedSearch = Arc<dyn WebSearch>;

/// Serper search configuration
#[derive(Debug, Clone)]
pub struct SerperConfig {
    pub api_key: String,
    /// Results requested per query
    pub num_results: usize,
    /// Optional two-letter country code for localized results
    pub country_code: Option<String>,
    pub http: HttpConfig,
}

impl SerperConfig {
    /// Fails when the key is empty
    pub fn new(api_key: &str) -> Result<Self, WebError> {
        if api_key.trim().is_empty() {
            return Err(WebError::MissingCredential("SERPER_API_KEY"));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            num_results: 10,
            country_code: None,
            http: HttpConfig::default(),
        })
    }

    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }

    pub fn with_country_code(mut self, code: Option<String>) -> Self {
        self.country_code = code;
        self
    }
}

/// Serper-backed web search
pub struct SerperSearch {
    client: Client,
    config: SerperConfig,
}

impl SerperSearch {
    pub fn new(config: SerperConfig) -> Result<Self, WebError> {
        let client = create_http_client(&config.http)?;
        Ok(Self { client, config })
    }

    fn request_body(&self, query: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "q": query,
            "num": self.config.num_results,
        });
        if let Some(gl) = &self.config.country_code {
            body["gl"] = serde_json::Value::String(gl.to_lowercase());
        }
        body
    }
}

#[async_trait]
impl WebSearch for SerperSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, WebError> {
        debug!("Serper search: {}", query);

        let response = self
            .client
            .post(SERPER_ENDPOINT)
            .header("X-API-KEY", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&self.request_body(query))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WebError::Status {
                service: "Serper",
                status,
                body,
            });
        }

        let data: SerperResponse = response.json().await?;
        let results = parse_serper_results(data, self.config.num_results);

        info!("Search '{}' returned {} results", query, results.len());
        Ok(results)
    }

    fn name(&self) -> &str {
        "serper"
    }
}

fn parse_serper_results(data: SerperResponse, limit: usize) -> Vec<SearchResult> {
    data.organic
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, item)| SearchResult {
            position: item.position.unwrap_or(idx + 1),
            title: item.title,
            url: item.link,
            snippet: item.snippet.unwrap_or_default(),
        })
        .collect()
}

/// Merge result lists from several queries, dropping repeated URLs.
///
/// The first occurrence wins; positions are renumbered in merged order.
pub fn merge_results(lists: Vec<Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for result in lists.into_iter().flatten() {
        let normalized = result.url.trim_end_matches('/').to_lowercase();
        if seen.insert(normalized) {
            merged.push(SearchResult {
                position: merged.len() + 1,
                ..result
            });
        }
    }

    merged
}

// Serper API response types
#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    position: Option<usize>,
}
