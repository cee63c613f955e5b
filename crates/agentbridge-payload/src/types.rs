use std::collections::HashMap;

use agentbridge_core::types::{CycleId, Platform};
use agentbridge_nodes::types::SystemEvent;
use agentbridge_ratelimit::RateLimitStatus;
use agentbridge_world::types::{ActionRecord, GeneratedMediaRef, PendingInvite};
use serde::Serialize;

/// A single message as surfaced to the decision service — a trimmed,
/// possibly-truncated view over `agentbridge_world::types::Message`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: String,
    pub sender_id: String,
    pub sender_display: Option<String>,
    pub content: String,
    pub timestamp: f64,
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
}

/// One channel entry in `TraditionalPayload::channels`: either `detailed`
/// (full recent message history) or `summary_only` (metadata and activity
/// counts, no messages) — spec §4.4.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelView {
    pub priority: &'static str,
    pub platform: Platform,
    pub name: String,
    pub topic: Option<String>,
    pub member_count: u64,
    pub last_activity_ts: f64,
    pub messages_last_hour: usize,
    pub messages_last_24h: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_messages: Option<Vec<MessageView>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub root_message_id: String,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionHistoryEntry {
    pub action_type: String,
    pub parameters: serde_json::Value,
    pub result: serde_json::Value,
    pub success: bool,
    pub channel_id: Option<String>,
    pub timestamp: f64,
    pub reasoning: Option<String>,
}

impl From<&ActionRecord> for ActionHistoryEntry {
    fn from(r: &ActionRecord) -> Self {
        Self {
            action_type: r.action_kind.clone(),
            parameters: r.parameters.clone(),
            result: r.result.clone(),
            success: r.success,
            channel_id: r.channel_id.clone(),
            timestamp: r.timestamp,
            reasoning: r.reasoning.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub cycle_id: CycleId,
    pub connection_states: HashMap<String, String>,
    pub rate_limits: RateLimitStatus,
    pub pending_invites: Vec<PendingInvite>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotIdentity {
    pub platform: Platform,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadStats {
    pub size_bytes: usize,
    pub size_kb: f64,
    pub channel_count: usize,
    pub message_count: usize,
    pub bot_identities: Vec<BotIdentity>,
}

/// Information about the last action the bot took, for the anti-loop block
/// (spec §4.4.1).
#[derive(Debug, Clone, Serialize)]
pub struct LastActionContext {
    pub action_type: String,
    pub parameters_summary: serde_json::Value,
    pub success: bool,
    pub result_preview: String,
    pub reasoning: String,
    pub seconds_since: f64,
    pub guidance: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelActivitySummary {
    pub channel_name: String,
    pub recent_bot_messages: usize,
    pub last_bot_message_time: f64,
    pub last_user_message_time: f64,
    pub time_since_last_user_message: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationPattern {
    pub channel_name: String,
    pub flags: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotActivityContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action: Option<LastActionContext>,
    pub channel_activity: HashMap<String, ChannelActivitySummary>,
    pub conversation_patterns: HashMap<String, ConversationPattern>,
    pub anti_loop_instruction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraditionalPayload {
    pub current_channel_id: Option<String>,
    pub channels: HashMap<String, ChannelView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<ThreadView>,
    pub action_history: Vec<ActionHistoryEntry>,
    pub system_status: SystemStatus,
    pub recent_media: Vec<GeneratedMediaRef>,
    pub bot_activity_context: BotActivityContext,
    pub payload_stats: PayloadStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollapsedNodeSummary {
    pub summary: String,
    pub data_changed: bool,
    pub last_summary_ts: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpansionStatusView {
    pub expanded: Vec<String>,
    pub pinned: Vec<String>,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodePayload {
    pub current_channel_id: Option<String>,
    pub system_status: SystemStatus,
    pub expanded_nodes: HashMap<String, serde_json::Value>,
    pub collapsed_node_summaries: HashMap<String, CollapsedNodeSummary>,
    pub expansion_status: ExpansionStatusView,
    pub system_events: Vec<SystemEvent>,
    pub payload_stats: PayloadStats,
}
