//! Domain → facebook page strategies.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::fetcher::fetch_site;
use crate::traits::{PageFetcher, WebSearcher};
use crate::util::{facebook_handle, leading_label, normalize_facebook_page, percent_decode};

// --- page link extraction ---

// The leading group keeps host suffixes like notfacebook.com from
// matching; it consumes one boundary character, hence captures_iter.
static RE_FACEBOOK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[^A-Za-z0-9.-])((?:https?://)?(?:www\.|m\.)?(?:facebook\.com|fb\.com)/[A-Za-z0-9_.\-/]+(?:\?[^"'\s<>]*)?)"#,
    )
    .unwrap()
});

static RE_DATA_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-href\s*=\s*["']([^"']*facebook\.com[^"']*)["']"#).unwrap());

static RE_PLUGIN_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"plugins/page\.php\?href=([^"'&\s]+)"#).unwrap());

/// Phrases facebook renders on dead or renamed pages.
const NOT_FOUND_MARKERS: &[&str] = &[
    "content isn't available",
    "content is currently unavailable",
    "page not found",
    "page isn't available",
];

/// Pull the first facebook page link out of raw HTML. Plain URLs are
/// tried first, then `data-href` embeds, then page-plugin iframes, each
/// pass in document order.
pub(super) fn scan_facebook_page(html: &str) -> Option<String> {
    for cap in RE_FACEBOOK_URL.captures_iter(html) {
        if let Some(page) = normalize_facebook_page(&cap[1]) {
            return Some(page);
        }
    }

    for cap in RE_DATA_HREF.captures_iter(html) {
        if let Some(page) = normalize_facebook_page(&cap[1]) {
            return Some(page);
        }
    }

    for cap in RE_PLUGIN_HREF.captures_iter(html) {
        if let Some(page) = normalize_facebook_page(&percent_decode(&cap[1])) {
            return Some(page);
        }
    }

    None
}

// --- strategies ---

/// Scan the site's own homepage for a facebook link.
pub(super) async fn from_site(fetcher: &dyn PageFetcher, domain: &str) -> Option<String> {
    let html = match fetch_site(fetcher, domain).await {
        Ok(html) => html,
        Err(e) => {
            debug!(domain, error = %e, "Site fetch failed");
            return None;
        }
    };

    scan_facebook_page(&html)
}

/// Web-search "{domain} facebook" and take the first hit that either
/// carries a handle resembling the domain or links back to it.
pub(super) async fn from_search(
    fetcher: &dyn PageFetcher,
    searcher: &dyn WebSearcher,
    domain: &str,
) -> Option<String> {
    let query = format!("{domain} facebook");
    let hits = match searcher.search(&query, 5).await {
        Ok(hits) => hits,
        Err(e) => {
            debug!(domain, error = %e, "Web search failed");
            return None;
        }
    };

    let label = leading_label(domain)?;

    for hit in hits {
        let Some(page) = normalize_facebook_page(&hit.url) else {
            continue;
        };

        if let Some(handle) = facebook_handle(&page) {
            if handle_matches_label(&handle, &label) {
                return Some(page);
            }
        }

        // Weak handle match. Trust the page only if it mentions the domain.
        if let Ok(body) = fetcher.page(&page).await {
            if body.to_lowercase().contains(&domain.to_lowercase()) {
                return Some(page);
            }
        }
    }

    None
}

/// Guess handles from the domain's leading label and keep the first that
/// resolves to a live page.
pub(super) async fn from_guess(fetcher: &dyn PageFetcher, domain: &str) -> Option<String> {
    let label = leading_label(domain)?;

    let mut candidates = vec![label.clone()];

    let mut capitalized = label.clone();
    if let Some(first) = capitalized.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    let stripped: String = label.chars().filter(char::is_ascii_alphanumeric).collect();

    for candidate in [capitalized, stripped] {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    for handle in candidates {
        let url = format!("https://www.facebook.com/{handle}");
        let body = match fetcher.page(&url).await {
            Ok(body) => body,
            Err(e) => {
                debug!(url = url.as_str(), error = %e, "Handle guess fetch failed");
                continue;
            }
        };

        let lowered = body.to_lowercase();
        if body.trim().is_empty() || NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
            continue;
        }

        return Some(url);
    }

    None
}

/// A handle matches the domain label when one contains the other, after
/// dropping case and punctuation.
fn handle_matches_label(handle: &str, label: &str) -> bool {
    let squash = |s: &str| {
        s.chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase()
    };

    let handle = squash(handle);
    let label = squash(label);
    if handle.is_empty() || label.is_empty() {
        return false;
    }
    handle.contains(&label) || label.contains(&handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hit, MockFetcher, MockSearcher};

    #[test]
    fn test_scan_takes_first_page_in_document_order() {
        let html = r#"
            <div class="fb-page" data-href="https://www.facebook.com/EmbeddedPage"></div>
            <a href="https://www.facebook.com/PlainPage">Find us</a>
        "#;
        assert_eq!(
            scan_facebook_page(html),
            Some("https://www.facebook.com/EmbeddedPage".to_string())
        );
    }

    #[test]
    fn test_scan_skips_utility_links() {
        let html = r#"
            <a href="https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fexample.org">Share</a>
            <a href="https://www.facebook.com/AcmeTools">Page</a>
        "#;
        assert_eq!(
            scan_facebook_page(html),
            Some("https://www.facebook.com/AcmeTools".to_string())
        );
    }

    #[test]
    fn test_scan_ignores_lookalike_hosts() {
        let html = r#"<a href="https://notfacebook.com/acme">fake</a>"#;
        assert_eq!(scan_facebook_page(html), None);
    }

    #[test]
    fn test_scan_decodes_plugin_embeds() {
        let html = r#"<iframe src="https://www.facebook.com/plugins/page.php?href=https%3A%2F%2Fwww.facebook.com%2FAcmeTools&tabs=timeline"></iframe>"#;
        assert_eq!(
            scan_facebook_page(html),
            Some("https://www.facebook.com/AcmeTools".to_string())
        );
    }

    #[tokio::test]
    async fn test_from_site_finds_homepage_link() {
        let fetcher = MockFetcher::new().on_page(
            "https://example.org",
            r#"<a href="https://www.facebook.com/acme">fb</a>"#,
        );

        let page = from_site(&fetcher, "example.org").await;

        assert_eq!(page, Some("https://www.facebook.com/acme".to_string()));
    }

    #[tokio::test]
    async fn test_from_site_absorbs_fetch_failure() {
        let fetcher = MockFetcher::new();

        assert_eq!(from_site(&fetcher, "example.org").await, None);
    }

    #[tokio::test]
    async fn test_from_search_accepts_matching_handle() {
        let searcher = MockSearcher::new().on_search(
            "acme-tools.com facebook",
            vec![hit("https://www.facebook.com/AcmeTools", "Acme Tools")],
        );
        let fetcher = MockFetcher::new();

        let page = from_search(&fetcher, &searcher, "acme-tools.com").await;

        assert_eq!(page, Some("https://www.facebook.com/AcmeTools".to_string()));
        // Handle matched the label, no vetting fetch needed.
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_from_search_vets_unrelated_handles_via_page_body() {
        let searcher = MockSearcher::new().on_search(
            "acme-tools.com facebook",
            vec![hit("https://www.facebook.com/SomeOtherName", "Acme")],
        );
        let fetcher = MockFetcher::new().on_page(
            "https://www.facebook.com/SomeOtherName",
            "<html>Visit us at acme-tools.com</html>",
        );

        let page = from_search(&fetcher, &searcher, "acme-tools.com").await;

        assert_eq!(page, Some("https://www.facebook.com/SomeOtherName".to_string()));
    }

    #[tokio::test]
    async fn test_from_search_rejects_unvetted_hits() {
        let searcher = MockSearcher::new().on_search(
            "acme-tools.com facebook",
            vec![hit("https://www.facebook.com/SomeOtherName", "Acme")],
        );
        let fetcher =
            MockFetcher::new().on_page("https://www.facebook.com/SomeOtherName", "<html></html>");

        assert_eq!(from_search(&fetcher, &searcher, "acme-tools.com").await, None);
    }

    #[tokio::test]
    async fn test_from_guess_takes_first_live_handle() {
        let fetcher = MockFetcher::new()
            .on_page("https://www.facebook.com/acme", "<html>Acme Tools Inc</html>");

        let page = from_guess(&fetcher, "acme.example.org").await;

        assert_eq!(page, Some("https://www.facebook.com/acme".to_string()));
    }

    #[tokio::test]
    async fn test_from_guess_skips_dead_pages() {
        let fetcher = MockFetcher::new()
            .on_page(
                "https://www.facebook.com/acme",
                "<html>This content isn't available right now</html>",
            )
            .on_page("https://www.facebook.com/Acme", "<html>Acme Tools Inc</html>");

        let page = from_guess(&fetcher, "acme.example.org").await;

        assert_eq!(page, Some("https://www.facebook.com/Acme".to_string()));
    }

    #[tokio::test]
    async fn test_from_guess_gives_up_when_nothing_resolves() {
        let fetcher = MockFetcher::new();

        assert_eq!(from_guess(&fetcher, "acme.example.org").await, None);
    }

    #[test]
    fn test_handle_matches_label_squashes_punctuation() {
        assert!(handle_matches_label("Acme.Tools", "acme-tools"));
        assert!(handle_matches_label("acmetoolsofficial", "acme-tools"));
        assert!(!handle_matches_label("unrelated", "acme-tools"));
    }
}
