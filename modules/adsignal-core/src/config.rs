//! Process configuration from environment variables.

use std::time::Duration;

use crate::detect::{parse_order, GoogleProbeKind, MetaProbeKind};

/// Default Meta probe order: authoritative source first, cheapest last.
pub const DEFAULT_META_PROBE_ORDER: &str = "graph_api,ad_library_search,ad_library_page";

/// Default Google probe order.
pub const DEFAULT_GOOGLE_PROBE_ORDER: &str = "transparency_center,site_signals";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub meta_access_token: Option<String>,
    pub serper_api_key: Option<String>,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    pub meta_probe_order: Vec<MetaProbeKind>,
    pub google_probe_order: Vec<GoogleProbeKind>,
}

impl Config {
    pub fn from_env() -> Self {
        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .expect("API_PORT must be a number");

        let http_timeout_secs: u64 = std::env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .expect("HTTP_TIMEOUT_SECS must be a number");
        let cache_ttl_secs: u64 = std::env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .expect("CACHE_TTL_SECS must be a number");

        let meta_probe_order = parse_order(
            &std::env::var("META_PROBE_ORDER")
                .unwrap_or_else(|_| DEFAULT_META_PROBE_ORDER.to_string()),
        )
        .unwrap_or_else(|e| panic!("META_PROBE_ORDER: {e}"));
        let google_probe_order = parse_order(
            &std::env::var("GOOGLE_PROBE_ORDER")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_PROBE_ORDER.to_string()),
        )
        .unwrap_or_else(|e| panic!("GOOGLE_PROBE_ORDER: {e}"));

        Self {
            api_host,
            api_port,
            meta_access_token: optional_env("META_ACCESS_TOKEN"),
            serper_api_key: optional_env("SERPER_API_KEY"),
            http_timeout: Duration::from_secs(http_timeout_secs),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            meta_probe_order,
            google_probe_order,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
