//! TTL result cache keyed by the raw check input.
//!
//! The key is built from the fields as the caller sent them (trimmed and
//! lower-cased), before any resolution runs. Two requests that normalize
//! to the same identity but arrive spelled differently are distinct
//! entries, which keeps cache behavior predictable from the outside.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::CheckResult;

/// Cache key for a check request.
pub fn fingerprint(domain: Option<&str>, social_page: Option<&str>) -> String {
    let norm = |value: Option<&str>| {
        value
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "none".to_string())
    };
    format!("check:{}:{}", norm(domain), norm(social_page))
}

/// Storage for finished check results.
///
/// Callers treat the cache as fail-open: a failed `get` means recompute,
/// a failed `set` means the result simply is not stored.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CheckResult>>;

    async fn set(&self, key: &str, value: CheckResult, ttl: Duration) -> Result<()>;
}

struct CacheEntry {
    value: CheckResult,
    expires_at: DateTime<Utc>,
}

/// In-process cache. Writes to the same key overwrite, expired entries
/// are dropped lazily on the next write.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CheckResult>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;

        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: CheckResult, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;

        entries.retain(|_, entry| entry.expires_at > Utc::now());
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Utc::now() + ttl,
            },
        );
        debug!(key, entries = entries.len(), "Cached check result");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CheckStatus, Identity};

    fn result(message: &str) -> CheckResult {
        CheckResult {
            identity: Identity::default(),
            has_meta_ads: false,
            has_google_ads: false,
            status: CheckStatus::Success,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_fingerprint_normalizes_case_and_whitespace() {
        assert_eq!(
            fingerprint(Some("  Example.ORG "), None),
            "check:example.org:none"
        );
        assert_eq!(
            fingerprint(None, Some("https://www.facebook.com/Acme")),
            "check:none:https://www.facebook.com/acme"
        );
        assert_eq!(fingerprint(Some(""), Some("   ")), "check:none:none");
    }

    #[tokio::test]
    async fn test_get_misses_on_empty_cache() {
        let cache = MemoryCache::new();
        assert!(cache.get("check:x:none").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let cache = MemoryCache::new();
        cache
            .set("k", result("first"), Duration::from_secs(60))
            .await
            .unwrap();

        let hit = cache.get("k").await.unwrap().unwrap();
        assert_eq!(hit.message, "first");
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = MemoryCache::new();
        cache
            .set("k", result("gone"), Duration::from_secs(0))
            .await
            .unwrap();

        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rewrite_replaces_entry() {
        let cache = MemoryCache::new();
        cache
            .set("k", result("old"), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("k", result("new"), Duration::from_secs(60))
            .await
            .unwrap();

        let hit = cache.get("k").await.unwrap().unwrap();
        assert_eq!(hit.message, "new");
    }
}
