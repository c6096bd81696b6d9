//! Google probes: the Ads Transparency Center, then on-site ad tech.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::fetcher::fetch_site;
use crate::traits::PageFetcher;
use crate::types::ProbeOutcome;

use super::SignalProbe;

// ===== Transparency Center markers =====

/// Markers that only render alongside advertiser results.
const ADVERTISER_INDICATORS: &[&str] = &[
    "advertiser-id",
    "advertiser_id",
    "creative-preview",
    "creative_preview",
    "ad-creative",
];

/// Phrases the center renders when a query matches no advertiser.
const EMPTY_TRANSPARENCY_MARKERS: &[&str] = &["no ads", "0 results", "no results"];

// ===== On-site ad tech markers =====

/// Ad tech fingerprints by category. A single category can be stray
/// boilerplate; conversion and remarketing tags only exist to serve paid
/// campaigns.
const SIGNAL_CATEGORIES: &[(&str, &[&str])] = &[
    ("tag_manager", &["googletagmanager.com", "gtag(", "gtm.js"]),
    ("ad_services", &["googleadservices.com", "googlesyndication.com"]),
    ("adsense", &["google_ad_client", "adsbygoogle", "data-ad-client"]),
    ("doubleclick", &["doubleclick.net", "googleads.g.doubleclick"]),
    ("conversion", &["google_conversion_id", "\"AW-", "'AW-"]),
    ("remarketing", &["google_remarketing_only", "google_conversion_label"]),
    ("shopping", &["merchant_id", "google_business_vertical"]),
    ("display", &["googlesyndication.com/pagead", "partner.googleadservices.com"]),
    ("video", &["youtube.com/embed", "googlevideo.com"]),
];

/// Categories that are sufficient on their own.
const STRONG_CATEGORIES: &[&str] = &["conversion", "remarketing"];

/// How many weak categories must co-occur to count as ad activity.
const MIN_SIGNAL_CATEGORIES: usize = 2;

// ===== transparency_center =====

/// Queries the Ads Transparency Center for the domain, by domain filter
/// and by free-text query.
pub struct TransparencyCenterProbe {
    fetcher: Arc<dyn PageFetcher>,
}

impl TransparencyCenterProbe {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    fn search_urls(domain: &str) -> [String; 2] {
        [
            format!("https://adstransparency.google.com/?region=anywhere&domain={domain}"),
            format!("https://adstransparency.google.com/?region=anywhere&query={domain}"),
        ]
    }
}

#[async_trait]
impl SignalProbe for TransparencyCenterProbe {
    fn name(&self) -> &'static str {
        "transparency_center"
    }

    async fn probe(&self, domain: &str) -> ProbeOutcome {
        let mut saw_empty = false;
        let mut last_error = None;

        for url in Self::search_urls(domain) {
            let body = match self.fetcher.page(&url).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(url = url.as_str(), error = %e, "Transparency center fetch failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let lowered = body.to_lowercase();
            if EMPTY_TRANSPARENCY_MARKERS.iter().any(|m| lowered.contains(m)) {
                debug!(domain, url = url.as_str(), "Transparency center reports an empty result");
                saw_empty = true;
                continue;
            }

            if let Some(marker) = ADVERTISER_INDICATORS.iter().find(|m| lowered.contains(**m)) {
                return ProbeOutcome::found(self.name(), format!("advertiser marker {marker:?}"));
            }
        }

        if saw_empty {
            return ProbeOutcome::absent_with(self.name(), "no advertiser found for this domain");
        }
        if let Some(e) = last_error {
            return ProbeOutcome::absent_with(self.name(), format!("fetch failed: {e}"));
        }
        ProbeOutcome::absent(self.name())
    }
}

// ===== site_signals =====

/// Fetches the site itself and fingerprints the ad tech embedded in it.
pub struct SiteSignalsProbe {
    fetcher: Arc<dyn PageFetcher>,
}

impl SiteSignalsProbe {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SignalProbe for SiteSignalsProbe {
    fn name(&self) -> &'static str {
        "site_signals"
    }

    async fn probe(&self, domain: &str) -> ProbeOutcome {
        let body = match fetch_site(self.fetcher.as_ref(), domain).await {
            Ok(body) => body,
            Err(e) => {
                debug!(domain, error = %e, "Site fetch failed");
                return ProbeOutcome::absent_with(self.name(), format!("fetch failed: {e}"));
            }
        };

        let matched: Vec<&str> = SIGNAL_CATEGORIES
            .iter()
            .filter(|(_, markers)| markers.iter().any(|m| body.contains(m)))
            .map(|(category, _)| *category)
            .collect();

        if let Some(strong) = matched.iter().find(|c| STRONG_CATEGORIES.contains(c)) {
            return ProbeOutcome::found(
                self.name(),
                format!("conversion-class signal {strong} (matched: {})", matched.join(", ")),
            );
        }

        match matched.len() {
            n if n >= MIN_SIGNAL_CATEGORIES => ProbeOutcome::found(
                self.name(),
                format!("{n} signal categories: {}", matched.join(", ")),
            ),
            1 => ProbeOutcome::absent_with(
                self.name(),
                format!("single weak signal: {}", matched[0]),
            ),
            _ => ProbeOutcome::absent(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    const DOMAIN: &str = "example.org";

    #[tokio::test]
    async fn test_transparency_center_finds_advertiser() {
        let [by_domain, _] = TransparencyCenterProbe::search_urls(DOMAIN);
        let fetcher = Arc::new(
            MockFetcher::new().on_page(&by_domain, r#"<div advertiser-id="AR123"></div>"#),
        );
        let probe = TransparencyCenterProbe::new(fetcher);

        let outcome = probe.probe(DOMAIN).await;

        assert!(outcome.present);
        assert!(outcome.evidence.as_deref().unwrap().contains("advertiser-id"));
    }

    #[tokio::test]
    async fn test_transparency_center_empty_result_is_a_miss() {
        let [by_domain, by_query] = TransparencyCenterProbe::search_urls(DOMAIN);
        let fetcher = Arc::new(
            MockFetcher::new()
                .on_page(&by_domain, "<html>No ads matched your search</html>")
                .on_page(&by_query, "<html>0 results</html>"),
        );
        let probe = TransparencyCenterProbe::new(fetcher);

        let outcome = probe.probe(DOMAIN).await;

        assert!(!outcome.present);
        assert_eq!(
            outcome.evidence.as_deref(),
            Some("no advertiser found for this domain")
        );
    }

    #[tokio::test]
    async fn test_transparency_center_absorbs_fetch_failure() {
        let probe = TransparencyCenterProbe::new(Arc::new(MockFetcher::new()));

        let outcome = probe.probe(DOMAIN).await;

        assert!(!outcome.present);
        assert!(outcome.evidence.as_deref().unwrap().starts_with("fetch failed"));
    }

    #[tokio::test]
    async fn test_site_signals_two_weak_categories_pass() {
        let html = r#"
            <script src="https://www.googletagmanager.com/gtm.js"></script>
            <script src="https://securepubads.doubleclick.net/tag"></script>
        "#;
        let fetcher = Arc::new(MockFetcher::new().on_page("https://example.org", html));
        let probe = SiteSignalsProbe::new(fetcher);

        let outcome = probe.probe(DOMAIN).await;

        assert!(outcome.present);
        let evidence = outcome.evidence.as_deref().unwrap();
        assert!(evidence.contains("tag_manager"));
        assert!(evidence.contains("doubleclick"));
    }

    #[tokio::test]
    async fn test_site_signals_conversion_tag_passes_alone() {
        let html = r#"<script>gtag('config', "AW-123456789");</script>"#;
        let fetcher = Arc::new(MockFetcher::new().on_page("https://example.org", html));
        let probe = SiteSignalsProbe::new(fetcher);

        let outcome = probe.probe(DOMAIN).await;

        assert!(outcome.present);
        assert!(outcome.evidence.as_deref().unwrap().contains("conversion"));
    }

    #[tokio::test]
    async fn test_site_signals_single_weak_category_fails() {
        let html = r#"<iframe src="https://www.youtube.com/embed/xyz"></iframe>"#;
        let fetcher = Arc::new(MockFetcher::new().on_page("https://example.org", html));
        let probe = SiteSignalsProbe::new(fetcher);

        let outcome = probe.probe(DOMAIN).await;

        assert!(!outcome.present);
        assert_eq!(outcome.evidence.as_deref(), Some("single weak signal: video"));
    }

    #[tokio::test]
    async fn test_site_signals_clean_site_fails() {
        let fetcher =
            Arc::new(MockFetcher::new().on_page("https://example.org", "<html>hello</html>"));
        let probe = SiteSignalsProbe::new(fetcher);

        let outcome = probe.probe(DOMAIN).await;

        assert!(!outcome.present);
        assert!(outcome.evidence.is_none());
    }

    #[tokio::test]
    async fn test_site_signals_falls_back_to_http() {
        let html = r#"<script>var google_conversion_id = 99;</script>"#;
        let fetcher = Arc::new(MockFetcher::new().on_page("http://example.org", html));
        let probe = SiteSignalsProbe::new(fetcher);

        let outcome = probe.probe(DOMAIN).await;

        assert!(outcome.present);
    }
}
