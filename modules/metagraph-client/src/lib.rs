pub mod error;

pub use error::{GraphError, Result};

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

/// Graph API version pinned for all endpoints.
const GRAPH_BASE_URL: &str = "https://graph.facebook.com/v18.0";

pub struct GraphClient {
    client: reqwest::Client,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageNode {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdsArchivePage {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

impl GraphClient {
    pub fn new(access_token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            access_token: access_token.map(String::from),
        }
    }

    /// Whether an access token is configured.
    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Resolve a page handle to its numeric id without credentials.
    /// The unauthenticated endpoint answers only for a minority of pages;
    /// callers treat `None` as a miss, not a fault.
    pub async fn page_id(&self, handle: &str) -> Result<Option<String>> {
        let endpoint = format!("{GRAPH_BASE_URL}/{handle}?fields=id");
        self.fetch_page_id(&endpoint, handle).await
    }

    /// Resolve a page handle to its numeric id using the configured token.
    /// Returns `Ok(None)` when no token is configured.
    pub async fn page_id_with_token(&self, handle: &str) -> Result<Option<String>> {
        let Some(ref token) = self.access_token else {
            debug!(handle, "No access token configured, skipping authenticated lookup");
            return Ok(None);
        };

        let endpoint = format!("{GRAPH_BASE_URL}/{handle}?fields=id&access_token={token}");
        self.fetch_page_id(&endpoint, handle).await
    }

    async fn fetch_page_id(&self, endpoint: &str, handle: &str) -> Result<Option<String>> {
        let resp = self.client.get(endpoint).send().await?;

        let status = resp.status();
        if !status.is_success() {
            // The Graph API rejects handle lookups for most pages unless the
            // token has page scope. That is a miss, not an API fault.
            debug!(handle, status = status.as_u16(), "Graph page lookup rejected");
            return Ok(None);
        }

        let node: PageNode = resp.json().await?;
        Ok(node.id)
    }

    /// Query the ad archive for any currently active ad belonging to a page.
    /// Returns `Ok(None)` when no token is configured (the archive endpoint
    /// requires one).
    pub async fn active_ads(&self, page_id: &str) -> Result<Option<bool>> {
        let Some(ref token) = self.access_token else {
            debug!(page_id, "No access token configured, skipping ads_archive lookup");
            return Ok(None);
        };

        let endpoint = format!(
            "{GRAPH_BASE_URL}/ads_archive?search_page_ids={page_id}\
             &ad_reached_countries=ALL&ad_active_status=ACTIVE&limit=1\
             &access_token={token}"
        );

        let resp = self.client.get(&endpoint).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GraphError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let page: AdsArchivePage = resp.json().await?;
        let active = !page.data.is_empty();
        info!(page_id, active, "ads_archive lookup complete");
        Ok(Some(active))
    }
}
