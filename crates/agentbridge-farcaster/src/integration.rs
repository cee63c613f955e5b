use std::collections::HashSet;
use std::sync::Mutex;

use agentbridge_channels::{
    error::ChannelError,
    types::{ChannelStatus, InboundMessage, Observation, OutboundMessage},
    Integration,
};
use agentbridge_core::types::Platform;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::client::FarcasterClient;

const POLL_INTERVAL_SECS: u64 = 15;
const FEED_LIMIT: u32 = 25;

/// Farcaster integration: polls mention/channel feeds on an interval (the
/// protocol has no native long-poll/sync primitive, unlike Matrix) and
/// posts casts back out. Grounded on
/// `original_source/chatbot/integrations/farcaster/observer.py`'s
/// `observe_feeds`/`_convert_casts_to_messages` dedup-by-hash logic and
/// `service.py`'s `post_cast`.
pub struct FarcasterIntegration {
    client: FarcasterClient,
    status: Mutex<ChannelStatus>,
    channels_to_monitor: Vec<String>,
    seen_hashes: Mutex<HashSet<String>>,
}

impl FarcasterIntegration {
    pub fn new(hub_url: String, api_key: String, signer_uuid: String, fid: u64, channels: Vec<String>) -> Self {
        Self {
            client: FarcasterClient::new(hub_url, api_key, signer_uuid, fid),
            status: Mutex::new(ChannelStatus::Disconnected),
            channels_to_monitor: channels,
            seen_hashes: Mutex::new(HashSet::new()),
        }
    }

    fn set_status(&self, status: ChannelStatus) {
        *self.status.lock().unwrap() = status;
    }

    fn emit_new_casts(&self, channel_id: &str, casts: &[Value], tx: &UnboundedSender<Observation>) {
        let mut seen = self.seen_hashes.lock().unwrap();
        for cast in casts {
            let hash = cast.get("hash").and_then(|v| v.as_str()).unwrap_or_default();
            if hash.is_empty() || seen.contains(hash) {
                continue;
            }
            let text = cast.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            if text.is_empty() {
                continue;
            }
            seen.insert(hash.to_string());

            let sender = cast
                .pointer("/author/username")
                .and_then(|v| v.as_str())
                .or_else(|| cast.pointer("/author/display_name").and_then(|v| v.as_str()))
                .unwrap_or("unknown")
                .to_string();
            let timestamp = cast
                .get("timestamp")
                .and_then(|v| v.as_str())
                .and_then(parse_timestamp)
                .unwrap_or_else(agentbridge_core::types::now_secs);
            let reply_to = cast
                .get("parent_hash")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            debug!(channel = %channel_id, sender, "farcaster: observed cast");

            let _ = tx.send(Observation::NewMessage(InboundMessage {
                platform: Platform::SocialNetwork,
                channel_id: channel_id.to_string(),
                sender_id: sender,
                sender_display: None,
                content: text.to_string(),
                timestamp,
                reply_to,
                media_urls: Vec::new(),
                raw_payload: None,
            }));
        }
    }
}

fn parse_timestamp(s: &str) -> Option<f64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp() as f64)
}

#[async_trait]
impl Integration for FarcasterIntegration {
    fn name(&self) -> &str {
        "farcaster"
    }

    fn platform(&self) -> Platform {
        Platform::SocialNetwork
    }

    async fn connect(&mut self) -> Result<(), ChannelError> {
        self.set_status(ChannelStatus::Connecting);
        self.client
            .test_connection()
            .await
            .map_err(|e| ChannelError::AuthFailed(e.to_string()))?;
        self.set_status(ChannelStatus::Connected);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ChannelError> {
        self.set_status(ChannelStatus::Disconnected);
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), ChannelError> {
        self.client
            .test_connection()
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::ConnectionFailed(e.to_string()))
    }

    fn status(&self) -> ChannelStatus {
        self.status.lock().unwrap().clone()
    }

    async fn run(&mut self, tx: UnboundedSender<Observation>) -> Result<(), ChannelError> {
        loop {
            match self.client.recent_mentions(FEED_LIMIT).await {
                Ok(resp) => {
                    let casts = resp
                        .get("casts")
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                    self.emit_new_casts("mentions", &casts, &tx);
                    self.set_status(ChannelStatus::Connected);
                }
                Err(e) => {
                    warn!(error = %e, "farcaster: mentions poll failed");
                    self.set_status(ChannelStatus::Error(e.to_string()));
                }
            }

            for channel in self.channels_to_monitor.clone() {
                match self.client.channel_feed(&channel, FEED_LIMIT).await {
                    Ok(resp) => {
                        let casts = resp
                            .get("casts")
                            .and_then(|v| v.as_array())
                            .cloned()
                            .unwrap_or_default();
                        self.emit_new_casts(&format!("channel_{channel}"), &casts, &tx);
                    }
                    Err(e) => warn!(channel = %channel, error = %e, "farcaster: channel poll failed"),
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(POLL_INTERVAL_SECS)).await;
        }
    }

    async fn send_message(&self, msg: &OutboundMessage) -> Result<String, ChannelError> {
        let channel_id = msg.channel_id.strip_prefix("channel_");
        self.client
            .post_cast(&msg.content, channel_id, msg.reply_to.as_deref(), &msg.media_urls)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn react(&self, message_id: &str, emoji: &str) -> Result<(), ChannelError> {
        let reaction_type = if emoji == "👎" { "dislike" } else { "like" };
        self.client
            .react_to_cast(message_id, reaction_type)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn lookup_profile(&self, user_id: &str) -> Result<Value, ChannelError> {
        self.client
            .user_profile(user_id)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn search(&self, query: &str) -> Result<Vec<Value>, ChannelError> {
        let resp = self
            .client
            .search_casts(query, FEED_LIMIT)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;
        Ok(resp
            .get("casts")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default())
    }
}
