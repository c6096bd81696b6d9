//! Test doubles for the pipeline's seams.
//!
//! One mock per trait: `MockFetcher` for HTTP, `MockSearcher` for web
//! search, `MockDirectory` for the Graph API, plus `MockProbe` and
//! `FailingCache` for chain and cache behavior. All record their calls
//! so tests can assert what was (and was not) touched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::cache::ResultCache;
use crate::detect::SignalProbe;
use crate::traits::{PageDirectory, PageFetcher, SearchHit, WebSearcher};
use crate::types::{CheckResult, ProbeOutcome};

/// Shorthand for a search result with an empty snippet.
pub fn hit(url: &str, title: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: title.to_string(),
        snippet: String::new(),
    }
}

// ===== MockFetcher =====

/// Serves registered page bodies and errors on everything else.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    /// Every URL requested, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn page(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("MockFetcher: no page registered for {url}"))
    }
}

// ===== MockSearcher =====

/// Serves registered hits per query and empty results otherwise.
#[derive(Default)]
pub struct MockSearcher {
    results: HashMap<String, Vec<SearchHit>>,
    queries: Mutex<Vec<String>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.results.insert(query.to_string(), hits);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

// ===== MockDirectory =====

/// Directory with scripted lookups. Starts uncredentialed, in which
/// state the authenticated calls answer `Ok(None)` like the real client.
#[derive(Default)]
pub struct MockDirectory {
    ids: HashMap<String, String>,
    authenticated_ids: HashMap<String, String>,
    active: HashMap<String, bool>,
    credentialed: bool,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self) -> Self {
        self.credentialed = true;
        self
    }

    pub fn on_page_id(mut self, handle: &str, id: &str) -> Self {
        self.ids.insert(handle.to_string(), id.to_string());
        self
    }

    pub fn on_authenticated_page_id(mut self, handle: &str, id: &str) -> Self {
        self.authenticated_ids.insert(handle.to_string(), id.to_string());
        self
    }

    pub fn on_active_ads(mut self, page_id: &str, active: bool) -> Self {
        self.active.insert(page_id.to_string(), active);
        self
    }
}

#[async_trait]
impl PageDirectory for MockDirectory {
    fn has_credentials(&self) -> bool {
        self.credentialed
    }

    async fn page_id(&self, handle: &str) -> Result<Option<String>> {
        Ok(self.ids.get(handle).cloned())
    }

    async fn page_id_authenticated(&self, handle: &str) -> Result<Option<String>> {
        if !self.credentialed {
            return Ok(None);
        }
        Ok(self.authenticated_ids.get(handle).cloned())
    }

    async fn active_ads(&self, page_id: &str) -> Result<Option<bool>> {
        if !self.credentialed {
            return Ok(None);
        }
        Ok(Some(self.active.get(page_id).copied().unwrap_or(false)))
    }
}

// ===== MockProbe =====

/// Probe with a fixed verdict and a call counter.
pub struct MockProbe {
    name: &'static str,
    present: bool,
    calls: AtomicUsize,
}

impl MockProbe {
    pub fn hit(name: &'static str) -> Self {
        Self {
            name,
            present: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn miss(name: &'static str) -> Self {
        Self {
            name,
            present: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalProbe for MockProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn probe(&self, _target: &str) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.present {
            ProbeOutcome::found(self.name, "mock signal")
        } else {
            ProbeOutcome::absent(self.name)
        }
    }
}

// ===== FailingCache =====

/// Cache whose every operation fails, for fail-open coverage.
pub struct FailingCache;

#[async_trait]
impl ResultCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<CheckResult>> {
        bail!("cache offline")
    }

    async fn set(&self, _key: &str, _value: CheckResult, _ttl: Duration) -> Result<()> {
        bail!("cache offline")
    }
}
