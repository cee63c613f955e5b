use thiserror::Error;

/// Errors that must propagate out of the decision client rather than
/// collapse into an empty `DecisionResult` (spec §4.7 error handling:
/// 413 and other non-2xx responses become empty decisions; HTTP 402 is the
/// one status the orchestrator needs to see directly so it can fall back to
/// a different model/profile).
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("decision service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("quota exhausted (HTTP 402): {body}")]
    QuotaExceeded { body: String },
}

pub type Result<T> = std::result::Result<T, DecisionError>;
