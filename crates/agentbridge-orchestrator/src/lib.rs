//! The cycle engine (spec §4.8, "C8"): the single repeating loop that
//! selects a focus channel, consults the rate limiter, builds a payload,
//! asks the decision service what to do, and dispatches the result.
//!
//! Grounded on `skynet-scheduler::engine::SchedulerEngine` for the
//! `tokio::select!` / `watch::Receiver<bool>` graceful-shutdown idiom, and
//! on `original_source/chatbot/core/json_observer_orchestrator.py` and
//! `enhanced_orchestrator.py` for the cycle body: dynamic traditional/
//! node-based mode selection and the two-phase exploration/action split.

pub mod engine;
pub mod error;
pub mod types;

pub use engine::Orchestrator;
pub use error::{OrchestratorError, Result};
pub use types::{CycleOutcome, PayloadMode};
