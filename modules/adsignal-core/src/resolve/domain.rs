//! Facebook page → domain, from the page's outbound links.

use tracing::debug;
use url::Url;

use crate::traits::PageFetcher;
use crate::util::{clean_domain, extract_links, is_social_host};

/// Unwrap facebook's link shim: `l.facebook.com/l.php?u=<target>`.
fn unwrap_redirect(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?;
    if host != "l.facebook.com" && host != "lm.facebook.com" {
        return None;
    }
    url.query_pairs()
        .find(|(k, _)| k == "u")
        .map(|(_, v)| v.into_owned())
}

/// First outbound link that points somewhere other than a social
/// platform. Pages list their own website early, so document order is
/// the ranking.
pub(super) async fn from_page(fetcher: &dyn PageFetcher, social_page: &str) -> Option<String> {
    let html = match fetcher.page(social_page).await {
        Ok(html) => html,
        Err(e) => {
            debug!(social_page, error = %e, "Page fetch failed");
            return None;
        }
    };

    for link in extract_links(&html, social_page) {
        let target = unwrap_redirect(&link).unwrap_or(link);

        let Ok(url) = Url::parse(&target) else {
            continue;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            continue;
        }
        let Some(host) = url.host_str() else {
            continue;
        };
        if is_social_host(host) {
            continue;
        }

        if let Some(domain) = clean_domain(&target) {
            debug!(social_page, domain = domain.as_str(), "Found outbound domain");
            return Some(domain);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    const PAGE: &str = "https://www.facebook.com/acme";

    #[tokio::test]
    async fn test_first_non_social_link_wins() {
        let fetcher = MockFetcher::new().on_page(
            PAGE,
            r#"
                <a href="https://www.instagram.com/acme">ig</a>
                <a href="https://www.acme-tools.com/about">site</a>
                <a href="https://other.example">other</a>
            "#,
        );

        let domain = from_page(&fetcher, PAGE).await;

        assert_eq!(domain, Some("acme-tools.com".to_string()));
    }

    #[tokio::test]
    async fn test_link_shim_is_unwrapped() {
        let fetcher = MockFetcher::new().on_page(
            PAGE,
            r#"<a href="https://l.facebook.com/l.php?u=https%3A%2F%2Facme-tools.com%2F&h=xyz">site</a>"#,
        );

        let domain = from_page(&fetcher, PAGE).await;

        assert_eq!(domain, Some("acme-tools.com".to_string()));
    }

    #[tokio::test]
    async fn test_all_social_links_yield_nothing() {
        let fetcher = MockFetcher::new().on_page(
            PAGE,
            r#"
                <a href="https://www.facebook.com/acme/about">about</a>
                <a href="https://twitter.com/acme">x</a>
            "#,
        );

        assert_eq!(from_page(&fetcher, PAGE).await, None);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_a_miss() {
        let fetcher = MockFetcher::new();

        assert_eq!(from_page(&fetcher, PAGE).await, None);
    }
}
