//! Ad presence checks for businesses identified by a domain, a facebook
//! page, or both.
//!
//! A check resolves the missing identity pieces (domain from page, page
//! from domain, page to numeric page id), then runs ordered probe chains
//! against Meta's Ad Library and Google's ad surfaces. Results are
//! cached by input for a configurable TTL. `pipeline::AdsPipeline` is
//! the entry point.

pub mod cache;
pub mod config;
pub mod detect;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod resolve;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod types;
pub mod util;

pub use cache::{fingerprint, MemoryCache, ResultCache};
pub use config::Config;
pub use error::PipelineError;
pub use pipeline::AdsPipeline;
pub use resolve::IdentityResolver;
pub use types::{
    CheckRequest, CheckResult, CheckStatus, Detection, Identity, Platform, ProbeOutcome,
};
