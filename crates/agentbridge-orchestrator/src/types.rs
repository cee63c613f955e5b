/// Which payload representation a cycle used (spec §4.4/§4.8's dynamic
/// mode switch, grounded on
/// `enhanced_orchestrator.py::_determine_processing_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    Traditional,
    NodeBased,
}

impl PayloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadMode::Traditional => "traditional",
            PayloadMode::NodeBased => "node_based",
        }
    }
}

/// Summary of one completed cycle (spec §4.8), returned to the caller and
/// logged; the durable record of what happened lives in C2's
/// `llm_observation` state-change row, which the engine writes itself.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub cycle_id: String,
    pub focus_channel_id: Option<String>,
    pub mode: PayloadMode,
    pub exploration_rounds: u32,
    pub used_fallback_model: bool,
    pub actions_dispatched: usize,
    pub actions_succeeded: usize,
}

/// Per-process focus-channel bookkeeping (spec §4.8 step 1: most recently
/// active channel with a triggering event, else round-robin). Cycle
/// scheduling state, not world data, so it lives here rather than in
/// `WorldState`.
#[derive(Debug, Default)]
pub struct FocusState {
    pub last_seen_activity_ts: f64,
    pub round_robin_cursor: usize,
}
