//! The check pipeline.
//!
//! One request moves through fixed stages: validate, consult the cache,
//! resolve the identity, run both detection chains, assemble and store
//! the result. Resolution misses never abort a check; only malformed
//! input and a crashed detection task do.


use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{fingerprint, ResultCache};
use crate::detect::DetectionChain;
use crate::error::PipelineError;
use crate::resolve::IdentityResolver;
use crate::types::{CheckRequest, CheckResult, CheckStatus, Detection, Identity};

pub struct AdsPipeline {
    resolver: IdentityResolver,
    meta_chain: Arc<DetectionChain>,
    google_chain: Arc<DetectionChain>,
    cache: Arc<dyn ResultCache>,
    cache_ttl: Duration,
}

impl AdsPipeline {
    pub fn new(
        resolver: IdentityResolver,
        meta_chain: DetectionChain,
        google_chain: DetectionChain,
        cache: Arc<dyn ResultCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            resolver,
            meta_chain: Arc::new(meta_chain),
            google_chain: Arc::new(google_chain),
            cache,
            cache_ttl,
        }
    }

    /// Run one check.
    ///
    /// Never returns an error: malformed input and internal faults are
    /// reported through `CheckResult::status`.
    pub async fn check(&self, request: &CheckRequest) -> CheckResult {
        match self.run(request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Pipeline aborted");
                match &e {
                    PipelineError::InvalidInput => CheckResult::invalid(e.to_string()),
                    PipelineError::Internal(_) => CheckResult::partial_failure(
                        Identity {
                            domain: normalize_field(request.domain.as_deref()),
                            social_page: normalize_field(request.facebook_page.as_deref()),
                            page_id: None,
                        },
                        e.to_string(),
                    ),
                }
            }
        }
    }

    async fn run(&self, request: &CheckRequest) -> Result<CheckResult, PipelineError> {
        // Validate. Nothing touches the network before this gate.
        let domain = normalize_field(request.domain.as_deref());
        let social_page = normalize_field(request.facebook_page.as_deref());
        if domain.is_none() && social_page.is_none() {
            return Err(PipelineError::InvalidInput);
        }

        // The cache key covers the raw input, not the resolved identity,
        // so a hit costs no resolution work. Read failures mean recompute.
        let key = fingerprint(domain.as_deref(), social_page.as_deref());
        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                info!(key = key.as_str(), "Cache hit");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(key = key.as_str(), error = %e, "Cache read failed, recomputing"),
        }

        let identity = self.resolve_identity(domain, social_page).await;
        let (meta, google) = self.detect(&identity).await?;

        let message = summary_message(&identity, meta.has_active_ads, google.has_active_ads);
        let result = CheckResult {
            identity,
            has_meta_ads: meta.has_active_ads,
            has_google_ads: google.has_active_ads,
            status: CheckStatus::Success,
            message,
        };

        info!(
            key = key.as_str(),
            has_meta_ads = result.has_meta_ads,
            has_google_ads = result.has_google_ads,
            "Check complete"
        );

        // Write failures lose the entry, not the check.
        if let Err(e) = self.cache.set(&key, result.clone(), self.cache_ttl).await {
            warn!(key = key.as_str(), error = %e, "Cache write failed");
        }

        Ok(result)
    }

    /// Fill in whatever identity fields the request left blank. Misses
    /// leave the field `None`; the check carries on regardless.
    async fn resolve_identity(
        &self,
        domain: Option<String>,
        social_page: Option<String>,
    ) -> Identity {
        let mut identity = Identity {
            domain,
            social_page,
            page_id: None,
        };

        if identity.social_page.is_none() {
            if let Some(domain) = identity.domain.as_deref() {
                identity.social_page = self.resolver.resolve_social_page(domain).await;
            }
        }

        if identity.domain.is_none() {
            if let Some(page) = identity.social_page.as_deref() {
                identity.domain = self.resolver.resolve_domain(page).await;
            }
        }

        // The Meta chain needs a numeric id, so this runs whenever a
        // page is known, even when the caller supplied the page itself.
        if let Some(page) = identity.social_page.as_deref() {
            identity.page_id = self.resolver.resolve_page_id(page).await;
        }

        identity
    }

    /// Run both platform chains concurrently. A chain whose target never
    /// resolved reports no ads without probing; a panicked task is the
    /// one genuinely internal fault the pipeline can hit.
    async fn detect(&self, identity: &Identity) -> Result<(Detection, Detection), PipelineError> {
        let meta_chain = self.meta_chain.clone();
        let google_chain = self.google_chain.clone();
        let page_id = identity.page_id.clone();
        let domain = identity.domain.clone();

        let meta_task = tokio::spawn(async move { meta_chain.detect(page_id.as_deref()).await });
        let google_task = tokio::spawn(async move { google_chain.detect(domain.as_deref()).await });

        let (meta, google) = tokio::join!(meta_task, google_task);
        let meta =
            meta.map_err(|e| PipelineError::Internal(format!("meta detection task: {e}")))?;
        let google =
            google.map_err(|e| PipelineError::Internal(format!("google detection task: {e}")))?;
        Ok((meta, google))
    }
}

fn normalize_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn summary_message(identity: &Identity, has_meta_ads: bool, has_google_ads: bool) -> String {
    let mut parts = Vec::new();

    match (&identity.domain, &identity.social_page) {
        (Some(_), Some(_)) => parts.push("Resolved both domain and Facebook page".to_string()),
        (Some(_), None) => parts.push("Domain provided".to_string()),
        (None, Some(_)) => parts.push("Facebook page provided".to_string()),
        (None, None) => {}
    }

    if has_meta_ads || has_google_ads {
        let mut found = Vec::new();
        if has_meta_ads {
            found.push("Meta ads detected");
        }
        if has_google_ads {
            found.push("Google ads detected");
        }
        parts.push(format!("Active ads found: {}", found.join(", ")));
    } else {
        parts.push("No active ads detected".to_string());
    }

    parts.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_field_trims_and_drops_blanks() {
        assert_eq!(normalize_field(Some(" example.org ")), Some("example.org".to_string()));
        assert_eq!(normalize_field(Some("   ")), None);
        assert_eq!(normalize_field(None), None);
    }

    #[test]
    fn test_summary_message_shapes() {
        let full = Identity {
            domain: Some("example.org".to_string()),
            social_page: Some("https://www.facebook.com/acme".to_string()),
            page_id: Some("123456789012".to_string()),
        };
        assert_eq!(
            summary_message(&full, true, true),
            "Resolved both domain and Facebook page. \
             Active ads found: Meta ads detected, Google ads detected"
        );
        assert_eq!(
            summary_message(&full, false, true),
            "Resolved both domain and Facebook page. Active ads found: Google ads detected"
        );

        let domain_only = Identity {
            domain: Some("example.org".to_string()),
            ..Identity::default()
        };
        assert_eq!(
            summary_message(&domain_only, false, false),
            "Domain provided. No active ads detected"
        );

        let page_only = Identity {
            social_page: Some("https://www.facebook.com/acme".to_string()),
            ..Identity::default()
        };
        assert_eq!(
            summary_message(&page_only, true, false),
            "Facebook page provided. Active ads found: Meta ads detected"
        );
    }
}
