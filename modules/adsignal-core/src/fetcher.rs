//! HTTP collaborators: the page fetcher and the Serper web search client.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::traits::{PageFetcher, SearchHit, WebSearcher};

/// Browser user agent for outbound fetches. The ad library and the
/// transparency center serve stripped or blocked responses to the default
/// reqwest agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Plain reqwest-backed fetcher used in production.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn page(&self, url: &str) -> Result<String> {
        debug!(url, "Fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("GET {url} returned status {status}");
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {url}"))?;

        debug!(url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// Fetch a site's homepage by bare domain, preferring https and falling
/// back to http when the https fetch fails outright.
pub async fn fetch_site(fetcher: &dyn PageFetcher, domain: &str) -> Result<String> {
    let https_url = format!("https://{domain}");
    match fetcher.page(&https_url).await {
        Ok(body) => Ok(body),
        Err(e) => {
            debug!(domain, error = %e, "https fetch failed, trying http");
            fetcher.page(&format!("http://{domain}")).await
        }
    }
}

/// Web search backed by the Serper API.
pub struct SerperSearcher {
    api_key: String,
    client: reqwest::Client,
}

impl SerperSearcher {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            api_key: api_key.to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        info!(query, "Running web search");

        let response = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query, "num": max_results }))
            .send()
            .await
            .context("Serper request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Serper returned status {status}");
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .context("Failed to parse Serper response")?;

        let hits: Vec<SearchHit> = parsed
            .organic
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                url: r.link,
                title: r.title,
                snippet: r.snippet,
            })
            .collect();

        info!(query, hits = hits.len(), "Web search finished");
        Ok(hits)
    }
}

/// No-op searcher for deployments without a Serper key. Every query
/// returns zero hits, so search-backed resolution quietly misses.
pub struct NoopSearcher;

#[async_trait]
impl WebSearcher for NoopSearcher {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(Vec::new())
    }
}
