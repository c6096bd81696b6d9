use thiserror::Error;

/// Faults that abort the pipeline. Everything else is absorbed below the
/// orchestrator: a resolution chain that exhausts its strategies yields an
/// absent field, and a probe fault yields an absent signal.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("either domain or facebook_page must be provided")]
    InvalidInput,

    #[error("internal fault: {0}")]
    Internal(String),
}
