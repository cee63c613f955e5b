use std::collections::HashMap;

use agentbridge_core::config::{NodeConfig, RetentionConfig};
use agentbridge_core::types::{CycleId, Platform};

/// Everything the payload builders need that isn't owned by C1/C3/C5
/// themselves — assembled by the Orchestrator each cycle (spec §4.8).
#[derive(Debug, Clone)]
pub struct BuildCtx {
    pub cycle_id: CycleId,
    pub focus_channel_id: Option<String>,
    pub now: f64,
    pub retention: RetentionConfig,
    pub nodes: NodeConfig,
    /// This system's own `(platform, sender_id)` pairs, used to separate
    /// the bot's own messages from user messages without a fragile
    /// single-id equality check (SPEC_FULL §2), and reported verbatim in
    /// `payload_stats.bot_identities`.
    pub bot_identifiers: Vec<(Platform, String)>,
    /// Integration name -> human-readable connection state string, supplied
    /// by the Orchestrator from `IntegrationManager::statuses()`.
    pub connection_states: HashMap<String, String>,
}
