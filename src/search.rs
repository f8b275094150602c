//! Optional web-search capability.
//!
//! The pipeline only ever talks to [`WebSearchProvider`]; the provider may
//! be HTTP-backed, a static double, or absent entirely.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSnippet {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub rank: u32,
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedSnippet>>;
}

/// Provider backed by a JSON search endpoint
/// (`GET {base_url}/search?q=...&n=...` returning a snippet array)
pub struct HttpSearchProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSearchProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl WebSearchProvider for HttpSearchProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedSnippet>> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("n", &limit.to_string())])
            .send()
            .await
            .context("Failed to reach search endpoint")?;

        if !response.status().is_success() {
            anyhow::bail!("search endpoint returned {}", response.status());
        }

        response
            .json::<Vec<RankedSnippet>>()
            .await
            .context("Failed to parse search response")
    }
}

/// In-memory provider for tests and offline development
#[derive(Default)]
pub struct StaticSearchProvider {
    snippets: Vec<RankedSnippet>,
}

impl StaticSearchProvider {
    pub fn new(snippets: Vec<RankedSnippet>) -> Self {
        Self { snippets }
    }
}

#[async_trait]
impl WebSearchProvider for StaticSearchProvider {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<RankedSnippet>> {
        Ok(self.snippets.iter().take(limit).cloned().collect())
    }
}
