//! Core data model for the check pipeline.

use serde::{Deserialize, Serialize};

// --- Identity ---

/// The identifiers a business can be known by. At pipeline entry at least
/// one of `domain`/`social_page` is present; after resolution any field may
/// still be absent. Partial resolution is a valid terminal state, not a
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub domain: Option<String>,
    pub social_page: Option<String>,
    pub page_id: Option<String>,
}

// --- Platforms ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Meta,
    Google,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Meta => "meta",
            Platform::Google => "google",
        }
    }
}

// --- Probe outcomes ---

/// One probe's verdict. Produced once per invocation, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub signal_name: String,
    pub present: bool,
    pub evidence: Option<String>,
}

impl ProbeOutcome {
    pub fn found(signal_name: &str, evidence: impl Into<String>) -> Self {
        Self {
            signal_name: signal_name.to_string(),
            present: true,
            evidence: Some(evidence.into()),
        }
    }

    pub fn absent(signal_name: &str) -> Self {
        Self {
            signal_name: signal_name.to_string(),
            present: false,
            evidence: None,
        }
    }

    /// Absent with a recorded reason: a negative marker on the fetched
    /// resource, or the failure class of a fetch/parse fault. Faults never
    /// escape a probe; they land here.
    pub fn absent_with(signal_name: &str, why: impl Into<String>) -> Self {
        Self {
            signal_name: signal_name.to_string(),
            present: false,
            evidence: Some(why.into()),
        }
    }
}

// --- Detection ---

/// Outcome of one platform's probe chain.
#[derive(Debug, Clone)]
pub struct Detection {
    pub platform: Platform,
    pub has_active_ads: bool,
    pub probes_attempted: Vec<ProbeOutcome>,
}

impl Detection {
    /// The no-target short-circuit: nothing probed, no ads asserted.
    pub fn skipped(platform: Platform) -> Self {
        Self {
            platform,
            has_active_ads: false,
            probes_attempted: Vec::new(),
        }
    }
}

// --- Check results ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Success,
    Invalid,
    PartialFailure,
}

/// Final answer for one request. Immutable once assembled; cached by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub identity: Identity,
    pub has_meta_ads: bool,
    pub has_google_ads: bool,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            identity: Identity::default(),
            has_meta_ads: false,
            has_google_ads: false,
            status: CheckStatus::Invalid,
            message: message.into(),
        }
    }

    pub fn partial_failure(identity: Identity, message: impl Into<String>) -> Self {
        Self {
            identity,
            has_meta_ads: false,
            has_google_ads: false,
            status: CheckStatus::PartialFailure,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CheckStatus::Success
    }
}

// --- Requests ---

/// Inbound request shape. At least one identifier must be present; empty
/// strings are treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckRequest {
    pub domain: Option<String>,
    pub facebook_page: Option<String>,
}
