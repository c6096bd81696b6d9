//! Identity resolution.
//!
//! Each operation is an ordered chain of fallback strategies. A strategy
//! that fails or finds nothing yields `None` and the chain moves on; a
//! chain that runs dry is a plain miss, never an error. The orchestrator
//! carries on with whatever identity fields did resolve.

mod domain;
mod page_id;
mod social_page;

use std::sync::Arc;

use tracing::info;

use crate::traits::{PageDirectory, PageFetcher, WebSearcher};

/// Strategies for finding a facebook page from a domain, cheapest first.
#[derive(Debug, Clone, Copy)]
enum SocialPageStrategy {
    /// Scan the site's own homepage for facebook links.
    SiteScan,
    /// Web-search "{domain} facebook" and vet the hits.
    WebSearch,
    /// Guess handles from the domain's leading label.
    HandleGuess,
}

const SOCIAL_PAGE_STRATEGIES: &[SocialPageStrategy] = &[
    SocialPageStrategy::SiteScan,
    SocialPageStrategy::WebSearch,
    SocialPageStrategy::HandleGuess,
];

/// Strategies for finding a numeric page id from a facebook page URL.
#[derive(Debug, Clone, Copy)]
enum PageIdStrategy {
    /// The URL itself may carry the id.
    UrlParse,
    /// Unauthenticated directory lookup by handle.
    DirectoryLookup,
    /// Token-backed directory lookup by handle.
    AuthenticatedLookup,
    /// Scrape the page HTML for embedded ids.
    HtmlScrape,
}

const PAGE_ID_STRATEGIES: &[PageIdStrategy] = &[
    PageIdStrategy::UrlParse,
    PageIdStrategy::DirectoryLookup,
    PageIdStrategy::AuthenticatedLookup,
    PageIdStrategy::HtmlScrape,
];

/// Fills in the missing pieces of an identity from whichever piece the
/// caller supplied.
pub struct IdentityResolver {
    fetcher: Arc<dyn PageFetcher>,
    searcher: Arc<dyn WebSearcher>,
    directory: Arc<dyn PageDirectory>,
}

impl IdentityResolver {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        searcher: Arc<dyn WebSearcher>,
        directory: Arc<dyn PageDirectory>,
    ) -> Self {
        Self {
            fetcher,
            searcher,
            directory,
        }
    }

    /// Domain → facebook page URL.
    pub async fn resolve_social_page(&self, domain: &str) -> Option<String> {
        for strategy in SOCIAL_PAGE_STRATEGIES {
            let found = match strategy {
                SocialPageStrategy::SiteScan => {
                    social_page::from_site(self.fetcher.as_ref(), domain).await
                }
                SocialPageStrategy::WebSearch => {
                    social_page::from_search(self.fetcher.as_ref(), self.searcher.as_ref(), domain)
                        .await
                }
                SocialPageStrategy::HandleGuess => {
                    social_page::from_guess(self.fetcher.as_ref(), domain).await
                }
            };

            if let Some(page) = found {
                info!(domain, page = page.as_str(), strategy = ?strategy, "Resolved social page");
                return Some(page);
            }
        }

        info!(domain, "No social page found");
        None
    }

    /// Facebook page URL → domain, from the page's outbound links.
    pub async fn resolve_domain(&self, social_page: &str) -> Option<String> {
        match domain::from_page(self.fetcher.as_ref(), social_page).await {
            Some(found) => {
                info!(social_page, domain = found.as_str(), "Resolved domain");
                Some(found)
            }
            None => {
                info!(social_page, "No domain found");
                None
            }
        }
    }

    /// Facebook page URL → numeric page id.
    pub async fn resolve_page_id(&self, social_page: &str) -> Option<String> {
        for strategy in PAGE_ID_STRATEGIES {
            let found = match strategy {
                PageIdStrategy::UrlParse => page_id::from_url(social_page),
                PageIdStrategy::DirectoryLookup => {
                    page_id::from_directory(self.directory.as_ref(), social_page, false).await
                }
                PageIdStrategy::AuthenticatedLookup => {
                    page_id::from_directory(self.directory.as_ref(), social_page, true).await
                }
                PageIdStrategy::HtmlScrape => {
                    page_id::from_html(self.fetcher.as_ref(), social_page).await
                }
            };

            if let Some(id) = found {
                info!(social_page, page_id = id.as_str(), strategy = ?strategy, "Resolved page id");
                return Some(id);
            }
        }

        info!(social_page, "No page id found");
        None
    }
}
