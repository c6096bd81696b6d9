//! Ad presence detection.
//!
//! Each platform gets an ordered chain of probes. Probes run one at a
//! time and the chain stops at the first positive, so a platform's flag
//! is the short-circuit OR of its probe outcomes. Probe order is
//! deployment configuration: authoritative sources first by default,
//! cheaper heuristics as fallback.

pub mod google;
pub mod meta;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::traits::{PageDirectory, PageFetcher};
use crate::types::{Detection, Platform, ProbeOutcome};

pub use google::{SiteSignalsProbe, TransparencyCenterProbe};
pub use meta::{AdLibraryPageProbe, AdLibrarySearchProbe, GraphApiProbe};

/// One ad presence signal for one platform.
///
/// A probe never errors out of the chain: network faults, blocks, and
/// parse trouble come back as an absent signal whose evidence names the
/// failure class. Probes do not retry internally.
#[async_trait]
pub trait SignalProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn probe(&self, target: &str) -> ProbeOutcome;
}

/// Ordered probes for one platform.
pub struct DetectionChain {
    platform: Platform,
    probes: Vec<Arc<dyn SignalProbe>>,
}

impl DetectionChain {
    pub fn new(platform: Platform, probes: Vec<Arc<dyn SignalProbe>>) -> Self {
        Self { platform, probes }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Run the chain against `target`, stopping at the first positive.
    ///
    /// Without a target there is nothing to probe: the chain reports no
    /// ads with an empty outcome list and touches no probe.
    pub async fn detect(&self, target: Option<&str>) -> Detection {
        let Some(target) = target.map(str::trim).filter(|t| !t.is_empty()) else {
            return Detection::skipped(self.platform);
        };

        let mut attempted = Vec::new();
        for probe in &self.probes {
            let outcome = probe.probe(target).await;
            info!(
                platform = self.platform.as_str(),
                probe = probe.name(),
                present = outcome.present,
                "Probe finished"
            );

            let hit = outcome.present;
            attempted.push(outcome);
            if hit {
                break;
            }
        }

        Detection {
            platform: self.platform,
            has_active_ads: attempted.iter().any(|o| o.present),
            probes_attempted: attempted,
        }
    }
}

/// Meta probes, in the order names appear in `META_PROBE_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaProbeKind {
    GraphApi,
    AdLibrarySearch,
    AdLibraryPage,
}

impl FromStr for MetaProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "graph_api" => Ok(Self::GraphApi),
            "ad_library_search" => Ok(Self::AdLibrarySearch),
            "ad_library_page" => Ok(Self::AdLibraryPage),
            other => Err(format!("unknown Meta probe '{other}'")),
        }
    }
}

/// Google probes, in the order names appear in `GOOGLE_PROBE_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoogleProbeKind {
    TransparencyCenter,
    SiteSignals,
}

impl FromStr for GoogleProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transparency_center" => Ok(Self::TransparencyCenter),
            "site_signals" => Ok(Self::SiteSignals),
            other => Err(format!("unknown Google probe '{other}'")),
        }
    }
}

/// Parse a comma-separated probe order string.
pub fn parse_order<K: FromStr<Err = String>>(raw: &str) -> Result<Vec<K>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(K::from_str)
        .collect()
}

/// Assemble the Meta chain. The `graph_api` probe needs an access token
/// and is dropped from the chain when the directory has none.
pub fn build_meta_chain(
    order: &[MetaProbeKind],
    fetcher: &Arc<dyn PageFetcher>,
    directory: &Arc<dyn PageDirectory>,
) -> DetectionChain {
    let mut probes: Vec<Arc<dyn SignalProbe>> = Vec::new();

    for kind in order {
        match kind {
            MetaProbeKind::GraphApi => {
                if directory.has_credentials() {
                    probes.push(Arc::new(GraphApiProbe::new(directory.clone())));
                } else {
                    warn!("graph_api probe configured without an access token, dropping");
                }
            }
            MetaProbeKind::AdLibrarySearch => {
                probes.push(Arc::new(AdLibrarySearchProbe::new(fetcher.clone())));
            }
            MetaProbeKind::AdLibraryPage => {
                probes.push(Arc::new(AdLibraryPageProbe::new(fetcher.clone())));
            }
        }
    }

    DetectionChain::new(Platform::Meta, probes)
}

/// Assemble the Google chain.
pub fn build_google_chain(
    order: &[GoogleProbeKind],
    fetcher: &Arc<dyn PageFetcher>,
) -> DetectionChain {
    let probes: Vec<Arc<dyn SignalProbe>> = order
        .iter()
        .map(|kind| match kind {
            GoogleProbeKind::TransparencyCenter => {
                Arc::new(TransparencyCenterProbe::new(fetcher.clone())) as Arc<dyn SignalProbe>
            }
            GoogleProbeKind::SiteSignals => Arc::new(SiteSignalsProbe::new(fetcher.clone())),
        })
        .collect();

    DetectionChain::new(Platform::Google, probes)
}
