//! Facebook page → numeric page id strategies.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::traits::{PageDirectory, PageFetcher};
use crate::util::facebook_handle;

/// Real page ids are long numerics. Anything shorter is a stray counter
/// or timestamp picked up by the scrape patterns.
const MIN_ID_DIGITS: usize = 8;
const MAX_ID_DIGITS: usize = 20;

static URL_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"facebook\.com/pages/[^/]+/(\d+)").unwrap(),
        Regex::new(r"profile\.php\?id=(\d+)").unwrap(),
        Regex::new(r"[?&]pageID=(\d+)").unwrap(),
    ]
});

static HTML_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#""page_id":"(\d+)""#).unwrap(),
        Regex::new(r#""pageID":"(\d+)""#).unwrap(),
        Regex::new(r#""entity_id":"(\d+)""#).unwrap(),
        Regex::new(r#"data-page-id="(\d+)""#).unwrap(),
        Regex::new(r"profile_id=(\d+)").unwrap(),
        Regex::new(r"fb://page/(\d+)").unwrap(),
        // Typed id: an "id" within shouting distance of a Page __typename.
        Regex::new(r#"(?s)"id":"(\d+)".{0,400}?"__typename":"Page""#).unwrap(),
    ]
});

/// Digit-count gate applied to every candidate, whatever its source.
fn valid_page_id(candidate: &str) -> bool {
    (MIN_ID_DIGITS..=MAX_ID_DIGITS).contains(&candidate.len())
        && candidate.chars().all(|c| c.is_ascii_digit())
}

/// The URL itself may carry the id (`/pages/Name/123`, `profile.php?id=`).
pub(super) fn from_url(social_page: &str) -> Option<String> {
    for pattern in URL_ID_PATTERNS.iter() {
        if let Some(cap) = pattern.captures(social_page) {
            let id = cap[1].to_string();
            if valid_page_id(&id) {
                return Some(id);
            }
        }
    }
    None
}

/// Directory lookup by handle, unauthenticated or token-backed.
pub(super) async fn from_directory(
    directory: &dyn PageDirectory,
    social_page: &str,
    authenticated: bool,
) -> Option<String> {
    let handle = facebook_handle(social_page)?;

    let lookup = if authenticated {
        directory.page_id_authenticated(&handle).await
    } else {
        directory.page_id(&handle).await
    };

    match lookup {
        Ok(Some(id)) if valid_page_id(&id) => Some(id),
        Ok(Some(id)) => {
            debug!(
                handle = handle.as_str(),
                id = id.as_str(),
                "Directory returned an implausible id"
            );
            None
        }
        Ok(None) => None,
        Err(e) => {
            debug!(handle = handle.as_str(), authenticated, error = %e, "Directory lookup failed");
            None
        }
    }
}

/// Scrape the page HTML for embedded ids.
pub(super) async fn from_html(fetcher: &dyn PageFetcher, social_page: &str) -> Option<String> {
    let html = match fetcher.page(social_page).await {
        Ok(html) => html,
        Err(e) => {
            debug!(social_page, error = %e, "Page fetch failed");
            return None;
        }
    };

    for pattern in HTML_ID_PATTERNS.iter() {
        for cap in pattern.captures_iter(&html) {
            let id = cap[1].to_string();
            if valid_page_id(&id) {
                return Some(id);
            }
        }
    }
    None
}
