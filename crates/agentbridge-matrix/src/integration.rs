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
use tracing::{debug, info, warn};

use crate::client::MatrixClient;

const SYNC_TIMEOUT_MS: u64 = 30_000;

/// Matrix integration: observes joined rooms via `/sync` long-polling and
/// sends messages/reactions back out. Grounded on
/// `original_source/chatbot/integrations/matrix/observer.py` (the
/// `_on_message` callback and room auto-registration) and `service.py`
/// (`send_message`, `reply_to_message`, `join_room`, `leave_room`).
pub struct MatrixIntegration {
    client: MatrixClient,
    status: Mutex<ChannelStatus>,
    rooms_to_monitor: Vec<String>,
}

impl MatrixIntegration {
    pub fn new(homeserver_url: String, access_token: String, user_id: String, rooms: Vec<String>) -> Self {
        Self {
            client: MatrixClient::new(homeserver_url, access_token, user_id),
            status: Mutex::new(ChannelStatus::Disconnected),
            rooms_to_monitor: rooms,
        }
    }

    fn set_status(&self, status: ChannelStatus) {
        *self.status.lock().unwrap() = status;
    }
}

#[async_trait]
impl Integration for MatrixIntegration {
    fn name(&self) -> &str {
        "matrix"
    }

    fn platform(&self) -> Platform {
        Platform::FederatedChat
    }

    async fn connect(&mut self) -> Result<(), ChannelError> {
        self.set_status(ChannelStatus::Connecting);
        self.client
            .whoami()
            .await
            .map_err(|e| ChannelError::AuthFailed(e.to_string()))?;

        for room in self.rooms_to_monitor.clone() {
            if let Err(e) = self.client.join_room(&room).await {
                warn!(room = %room, error = %e, "matrix: failed to join room");
            } else {
                info!(room = %room, "matrix: joined room");
            }
        }

        self.set_status(ChannelStatus::Connected);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ChannelError> {
        self.set_status(ChannelStatus::Disconnected);
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), ChannelError> {
        self.client
            .whoami()
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::ConnectionFailed(e.to_string()))
    }

    fn status(&self) -> ChannelStatus {
        self.status.lock().unwrap().clone()
    }

    async fn run(&mut self, tx: UnboundedSender<Observation>) -> Result<(), ChannelError> {
        let self_id = self.client.user_id().to_string();
        let mut since: Option<String> = None;

        loop {
            let resp = match self.client.sync(since.as_deref(), SYNC_TIMEOUT_MS).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "matrix: sync failed, retrying");
                    self.set_status(ChannelStatus::Error(e.to_string()));
                    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                    continue;
                }
            };
            self.set_status(ChannelStatus::Connected);

            if let Some(token) = resp.get("next_batch").and_then(|v| v.as_str()) {
                since = Some(token.to_string());
            }

            if let Some(invites) = resp
                .pointer("/rooms/invite")
                .and_then(|v| v.as_object())
            {
                for (room_id, invite) in invites {
                    let inviter = invite
                        .pointer("/invite_state/events")
                        .and_then(|events| events.as_array())
                        .and_then(|events| {
                            events
                                .iter()
                                .find(|e| e.get("type").and_then(|t| t.as_str()) == Some("m.room.member"))
                        })
                        .and_then(|e| e.get("sender"))
                        .and_then(|s| s.as_str())
                        .unwrap_or("unknown")
                        .to_string();
                    let _ = tx.send(Observation::Invite {
                        channel_id: room_id.clone(),
                        inviter,
                        channel_name: None,
                        topic: None,
                    });
                }
            }

            if let Some(joined) = resp.pointer("/rooms/join").and_then(|v| v.as_object()) {
                for (room_id, room) in joined {
                    let events = room
                        .pointer("/timeline/events")
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                    for event in events {
                        handle_timeline_event(&self_id, room_id, &event, &tx);
                    }
                }
            }
        }
    }

    async fn send_message(&self, msg: &OutboundMessage) -> Result<String, ChannelError> {
        self.client
            .send_message(&msg.channel_id, &msg.content, msg.reply_to.as_deref())
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn join_room(&self, channel_id: &str) -> Result<(), ChannelError> {
        self.client
            .join_room(channel_id)
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn leave_room(&self, channel_id: &str) -> Result<(), ChannelError> {
        self.client
            .leave_room(channel_id)
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn react(&self, message_id: &str, emoji: &str) -> Result<(), ChannelError> {
        // message_id is expected encoded as "{room_id}:{event_id}".
        let Some((room_id, event_id)) = message_id.split_once(':') else {
            return Err(ChannelError::SendFailed("malformed message id".into()));
        };
        self.client
            .send_reaction(room_id, event_id, emoji)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn lookup_profile(&self, user_id: &str) -> Result<Value, ChannelError> {
        self.client
            .user_profile(user_id)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn request_keys(&self, event_id: &str, channel_id: &str) -> Result<(), ChannelError> {
        self.client
            .request_room_key(channel_id, event_id)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }
}

fn handle_timeline_event(
    self_id: &str,
    room_id: &str,
    event: &Value,
    tx: &UnboundedSender<Observation>,
) {
    let event_type = event.get("type").and_then(|v| v.as_str()).unwrap_or_default();
    let sender = event.get("sender").and_then(|v| v.as_str()).unwrap_or_default();

    if event_type == "m.room.encrypted" {
        let event_id = event.get("event_id").and_then(|v| v.as_str()).unwrap_or_default();
        let _ = tx.send(Observation::Undecryptable {
            event_id: event_id.to_string(),
            channel_id: room_id.to_string(),
            sender: Some(sender.to_string()),
        });
        return;
    }

    if event_type != "m.room.message" {
        return;
    }
    if sender == self_id {
        return;
    }

    let content = event.get("content").cloned().unwrap_or(Value::Null);
    let body = content.get("body").and_then(|v| v.as_str()).unwrap_or_default();
    let event_id = event.get("event_id").and_then(|v| v.as_str()).unwrap_or_default();
    let timestamp = event
        .get("origin_server_ts")
        .and_then(|v| v.as_f64())
        .map(|ms| ms / 1000.0)
        .unwrap_or_else(agentbridge_core::types::now_secs);
    let reply_to = content
        .pointer("/m.relates_to/m.in_reply_to/event_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    debug!(room = %room_id, sender, "matrix: observed message");

    let _ = tx.send(Observation::NewMessage(InboundMessage {
        platform: Platform::FederatedChat,
        channel_id: room_id.to_string(),
        sender_id: sender.to_string(),
        sender_display: None,
        content: body.to_string(),
        timestamp,
        reply_to,
        media_urls: Vec::new(),
        raw_payload: None,
    }));
    let _ = event_id;
}
