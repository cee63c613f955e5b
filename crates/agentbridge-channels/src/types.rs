use agentbridge_core::types::Platform;
use serde::{Deserialize, Serialize};

/// Something an integration observed on its platform and handed to the
/// ingest task for world-state application (spec §4 Integration contract).
/// A single integration may emit any of these as events arrive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    NewMessage(InboundMessage),
    Invite {
        channel_id: String,
        inviter: String,
        channel_name: Option<String>,
        topic: Option<String>,
    },
    MembershipChange {
        channel_id: String,
        member_count: u64,
    },
    Undecryptable {
        event_id: String,
        channel_id: String,
        sender: Option<String>,
    },
}

/// A message received from an external platform (Matrix room, Farcaster cast, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub platform: Platform,
    pub channel_id: String,
    pub sender_id: String,
    pub sender_display: Option<String>,
    pub content: String,
    /// Unix seconds.
    pub timestamp: f64,
    pub reply_to: Option<String>,
    pub media_urls: Vec<String>,
    pub raw_payload: Option<serde_json::Value>,
}

/// A message to be delivered to an external platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel_id: String,
    pub content: String,
    pub reply_to: Option<String>,
    pub media_urls: Vec<String>,
    pub format: MessageFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFormat {
    #[default]
    PlainText,
    Markdown,
    Html,
}

/// Runtime connection state of an integration adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Connected,
    Connecting,
    Disconnected,
    Error(String),
}
