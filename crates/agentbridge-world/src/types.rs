use agentbridge_core::types::Platform;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

pub const RECENT_MESSAGES_CAP: usize = 50;
pub const ACTION_HISTORY_CAP: usize = 100;
pub const RATE_SNAPSHOT_STALE_SECS: f64 = 600.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub platform: Platform,
    pub sender_id: String,
    pub sender_display: Option<String>,
    pub content: String,
    pub timestamp: f64,
    pub reply_to: Option<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Joined,
    Left,
    Banned,
    Invited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Message timestamps within the last hour, used to derive the 1h/24h
    /// rolling counts and to drive keyword/sender-set decay.
    pub hourly_timestamps: VecDeque<f64>,
    pub daily_timestamps: VecDeque<f64>,
    pub senders_last_hour: HashSet<String>,
    pub keywords_last_hour: HashSet<String>,
    pub last_summary_ts: Option<f64>,
}

impl Default for ActivityMetrics {
    fn default() -> Self {
        Self {
            hourly_timestamps: VecDeque::new(),
            daily_timestamps: VecDeque::new(),
            senders_last_hour: HashSet::new(),
            keywords_last_hour: HashSet::new(),
            last_summary_ts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub platform: Platform,
    pub name: String,
    pub topic: Option<String>,
    pub status: ChannelStatus,
    pub member_count: u64,
    pub encrypted: bool,
    pub canonical_alias: Option<String>,
    #[serde(default)]
    pub power_levels: HashMap<String, i64>,
    #[serde(default)]
    pub recent_messages: VecDeque<Message>,
    pub last_activity_ts: f64,
    #[serde(default)]
    pub activity_metrics: ActivityMetrics,
}

impl Channel {
    pub fn new(id: impl Into<String>, platform: Platform, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            platform,
            name: name.into(),
            topic: None,
            status: ChannelStatus::Joined,
            member_count: 0,
            encrypted: false,
            canonical_alias: None,
            power_levels: HashMap::new(),
            recent_messages: VecDeque::new(),
            last_activity_ts: 0.0,
            activity_metrics: ActivityMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub platform: Platform,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub follower_count: Option<u64>,
    pub following_count: Option<u64>,
    pub verified: bool,
    pub power_badge: bool,
    pub bio: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, platform: Platform) -> Self {
        Self {
            id: id.into(),
            platform,
            handle: None,
            display_name: None,
            follower_count: None,
            following_count: None,
            verified: false,
            power_badge: false,
            bio: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: String,
    pub action_kind: String,
    pub parameters: serde_json::Value,
    pub result: serde_json::Value,
    pub success: bool,
    pub channel_id: Option<String>,
    pub platform: Option<Platform>,
    pub timestamp: f64,
    pub duration_ms: Option<u64>,
    pub reasoning: Option<String>,
    /// Identifies actions taken by the bot itself vs. reported by a peer,
    /// so the payload builder can filter `sender==self` from the noise
    /// surfaced to the LLM (spec §4.4: own action_history is excluded).
    #[serde(default)]
    pub is_self: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    UserInput,
    LlmObservation,
    ToolExecution,
    WorldUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangeBlock {
    pub timestamp: f64,
    pub change_type: ChangeType,
    pub source: String,
    pub channel_id: Option<String>,
    pub observations: Option<String>,
    pub potential_actions: Option<serde_json::Value>,
    pub selected_actions: Option<serde_json::Value>,
    pub reasoning: Option<String>,
    pub raw_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingInvite {
    pub channel_id: String,
    pub inviter: String,
    pub channel_name: String,
    pub invited_at: f64,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedMediaRef {
    pub media_id: String,
    pub url: String,
    pub storage_url: Option<String>,
    pub prompt: String,
    pub aspect_ratio: Option<String>,
    pub created_at: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndecryptableEvent {
    pub event_id: String,
    pub channel_id: String,
    pub sender: String,
    pub retry_count: u32,
    pub last_retry_ts: f64,
    pub max_retries: u32,
}

impl UndecryptableEvent {
    pub fn new(event_id: impl Into<String>, channel_id: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            channel_id: channel_id.into(),
            sender: sender.into(),
            retry_count: 0,
            last_retry_ts: agentbridge_core::types::now_secs(),
            max_retries: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub limit: u32,
    pub remaining: u32,
    pub reset_ts: f64,
    pub retry_after_ms: Option<u64>,
    pub last_updated: f64,
}

impl RateLimitSnapshot {
    pub fn is_stale(&self, now: f64) -> bool {
        now - self.last_updated > RATE_SNAPSHOT_STALE_SECS
    }
}
