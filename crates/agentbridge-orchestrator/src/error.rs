use thiserror::Error;

/// Per-cycle failures are never propagated — `process_cycle` degrades to
/// an empty decision and keeps running (spec §4.8 "never crash the
/// cycle"). This type covers only the operations the CLI composition root
/// calls directly outside the cycle loop.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("history error: {0}")]
    History(#[from] agentbridge_history::HistoryError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
