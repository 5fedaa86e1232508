use thiserror::Error;

/// Failures raised by the chain-facing adapters (state reader, submitter).
#[derive(Debug, Error)]
pub enum ChainError {
    /// The node could not be reached or returned an unusable response.
    #[error("chain state unavailable: {0}")]
    Unavailable(String),

    /// The transaction was refused; the reason string is passed through
    /// verbatim for caller-side classification.
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Fatal failures of a single planning/execution attempt. Nothing here is
/// retried internally; the caller starts a fresh cycle with new observations.
#[derive(Debug, Error)]
pub enum PositionError {
    /// A tick, operand, or computed value fell outside its representable
    /// bounds. Planning aborts rather than wrapping around.
    #[error("out of range: {0}")]
    Range(String),

    /// A condition the planner guarantees was violated anyway. Indicates a
    /// logic defect, not bad input.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The initial pool observation could not be read.
    #[error("pool state unavailable")]
    Unavailable(#[source] ChainError),

    /// The pre-submission observation could not be refreshed; the attempt
    /// must not proceed on stale parameters.
    #[error("pool state went stale before submission")]
    StaleState(#[source] ChainError),

    /// The submitter failed. Carries the drift and slippage that were in
    /// force so the caller can diagnose before re-planning.
    #[error("mint submission failed ({reason}); drift {drift} ticks, slippage {slippage_percent}%")]
    Submission {
        reason: String,
        drift: i32,
        slippage_percent: f64,
    },
}
