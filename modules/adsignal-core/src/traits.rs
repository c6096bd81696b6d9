//! Seams between the pipeline and the outside world.
//!
//! The resolver and the detection chains talk to HTTP, web search, and the
//! Graph API only through these traits. That keeps every chain testable
//! with the mocks in `testing`: no network, `cargo test` in seconds.

use anyhow::Result;
use async_trait::async_trait;

/// Fetches one page body over HTTP.
///
/// A non-2xx status is an `Err`: callers decide whether a failed fetch is
/// a miss or a fault, the fetcher does not.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn page(&self, url: &str) -> Result<String>;
}

/// One organic result from a web search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Runs a web search and returns organic hits in rank order.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// Looks up pages and their ad activity in a page directory.
///
/// `Ok(None)` is a miss (the directory has no answer), `Err` is a fault.
/// The authenticated variants return `Ok(None)` when no credentials are
/// configured so chains can skip them without special-casing.
#[async_trait]
pub trait PageDirectory: Send + Sync {
    fn has_credentials(&self) -> bool;

    async fn page_id(&self, handle: &str) -> Result<Option<String>>;

    async fn page_id_authenticated(&self, handle: &str) -> Result<Option<String>>;

    async fn active_ads(&self, page_id: &str) -> Result<Option<bool>>;
}

#[async_trait]
impl PageDirectory for metagraph_client::GraphClient {
    fn has_credentials(&self) -> bool {
        self.has_token()
    }

    async fn page_id(&self, handle: &str) -> Result<Option<String>> {
        Ok(self.page_id(handle).await?)
    }

    async fn page_id_authenticated(&self, handle: &str) -> Result<Option<String>> {
        Ok(self.page_id_with_token(handle).await?)
    }

    async fn active_ads(&self, page_id: &str) -> Result<Option<bool>> {
        Ok(self.active_ads(page_id).await?)
    }
}
