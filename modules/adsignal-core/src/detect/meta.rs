//! Meta probes: Graph API ads_archive, then two Ad Library page reads.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::traits::{PageDirectory, PageFetcher};
use crate::types::ProbeOutcome;

use super::SignalProbe;

// ===== Ad Library response markers =====

/// Markers in the async search response that only appear on ad payloads.
const ARCHIVE_INDICATORS: &[&str] = &[
    "ad_archive_id",
    "snapshot_url",
    "\"isActive\":true",
    "\"delivery_status\":\"active\"",
    "forwardCursor",
];

/// Phrases the library renders when a page has no active ads.
const EMPTY_LIBRARY_MARKERS: &[&str] = &["no ads to show", "hasn't run any ads", "0 results"];

/// Markers on the library page proper that identify real ad cards.
const STRONG_PAGE_INDICATORS: &[&str] = &[
    "ad_archive_id",
    "snapshot_url",
    "\"delivery_status\":\"active\"",
    "data-ad-id=",
];

/// Markers that also show up in library boilerplate. Only a pile of them
/// reads as ad cards.
const GENERIC_CARD_MARKERS: &[&str] = &["ad_snapshot", "\"is_active\""];

/// How many generic markers it takes before they count as ad cards.
const AD_CARD_THRESHOLD: usize = 5;

// ===== graph_api =====

/// Asks the Graph API ads_archive whether the page has an active ad.
/// Authoritative when a token is configured.
pub struct GraphApiProbe {
    directory: Arc<dyn PageDirectory>,
}

impl GraphApiProbe {
    pub fn new(directory: Arc<dyn PageDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl SignalProbe for GraphApiProbe {
    fn name(&self) -> &'static str {
        "graph_api"
    }

    async fn probe(&self, page_id: &str) -> ProbeOutcome {
        match self.directory.active_ads(page_id).await {
            Ok(Some(true)) => ProbeOutcome::found(self.name(), "ads_archive lists an active ad"),
            Ok(Some(false)) => ProbeOutcome::absent(self.name()),
            Ok(None) => ProbeOutcome::absent_with(self.name(), "no access token configured"),
            Err(e) => {
                warn!(page_id, error = %e, "Graph API probe failed");
                ProbeOutcome::absent_with(self.name(), format!("lookup failed: {e}"))
            }
        }
    }
}

// ===== ad_library_search =====

/// Reads the Ad Library's async search endpoint for the page id and
/// looks for ad payload markers in the response.
pub struct AdLibrarySearchProbe {
    fetcher: Arc<dyn PageFetcher>,
}

impl AdLibrarySearchProbe {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    fn endpoint(page_id: &str) -> String {
        format!(
            "https://www.facebook.com/ads/library/async/search_ads/?q=&ad_type=all\
             &search_type=page&page_ids={page_id}&active_status=active&country=ALL\
             &media_type=all"
        )
    }
}

#[async_trait]
impl SignalProbe for AdLibrarySearchProbe {
    fn name(&self) -> &'static str {
        "ad_library_search"
    }

    async fn probe(&self, page_id: &str) -> ProbeOutcome {
        let body = match self.fetcher.page(&Self::endpoint(page_id)).await {
            Ok(body) => body,
            Err(e) => {
                debug!(page_id, error = %e, "Ad library search fetch failed");
                return ProbeOutcome::absent_with(self.name(), format!("fetch failed: {e}"));
            }
        };

        match ARCHIVE_INDICATORS.iter().find(|m| body.contains(**m)) {
            Some(marker) => ProbeOutcome::found(self.name(), format!("archive marker {marker:?}")),
            None => ProbeOutcome::absent(self.name()),
        }
    }
}

// ===== ad_library_page =====

/// Loads the public Ad Library page for the id, under both URL shapes
/// the library serves, and reads it for ad cards or an explicit empty
/// state.
pub struct AdLibraryPageProbe {
    fetcher: Arc<dyn PageFetcher>,
}

impl AdLibraryPageProbe {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    fn page_urls(page_id: &str) -> [String; 2] {
        [
            format!(
                "https://www.facebook.com/ads/library/?active_status=active&ad_type=all\
                 &country=ALL&view_all_page_id={page_id}"
            ),
            format!(
                "https://www.facebook.com/ads/library/?active_status=active&ad_type=all\
                 &country=ALL&id={page_id}"
            ),
        ]
    }
}

#[async_trait]
impl SignalProbe for AdLibraryPageProbe {
    fn name(&self) -> &'static str {
        "ad_library_page"
    }

    async fn probe(&self, page_id: &str) -> ProbeOutcome {
        let mut saw_empty = false;
        let mut last_error = None;

        for url in Self::page_urls(page_id) {
            let body = match self.fetcher.page(&url).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(url = url.as_str(), error = %e, "Ad library page fetch failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let lowered = body.to_lowercase();
            if EMPTY_LIBRARY_MARKERS.iter().any(|m| lowered.contains(m)) {
                debug!(page_id, url = url.as_str(), "Ad library reports an empty result");
                saw_empty = true;
                continue;
            }

            if let Some(marker) = STRONG_PAGE_INDICATORS.iter().find(|m| body.contains(**m)) {
                return ProbeOutcome::found(self.name(), format!("library marker {marker:?}"));
            }

            let cards: usize = GENERIC_CARD_MARKERS
                .iter()
                .map(|m| body.matches(m).count())
                .sum();
            if cards > AD_CARD_THRESHOLD {
                return ProbeOutcome::found(
                    self.name(),
                    format!("repeated ad card markers ({cards})"),
                );
            }
        }

        if saw_empty {
            return ProbeOutcome::absent_with(self.name(), "library reports no ads for this page");
        }
        if let Some(e) = last_error {
            return ProbeOutcome::absent_with(self.name(), format!("fetch failed: {e}"));
        }
        ProbeOutcome::absent(self.name())
    }
}
