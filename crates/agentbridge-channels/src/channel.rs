use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use agentbridge_core::types::Platform;

use crate::{
    error::ChannelError,
    types::{ChannelStatus, Observation, OutboundMessage},
};

/// Common interface implemented by every platform integration (Matrix,
/// Farcaster, …). Mirrors the source's `Integration` contract (spec §4 /
/// §6): connection lifecycle, outbound sending, and an ingestion loop that
/// feeds observations to the shared ingest task. Optional capabilities
/// (room management, reactions, media, profile lookup, search,
/// notifications, key requests) default to [`ChannelError::NotSupported`]
/// so an adapter only needs to override the ones its platform offers.
#[async_trait]
pub trait Integration: Send + Sync {
    /// Stable lowercase identifier (e.g. `"matrix"`, `"farcaster"`).
    fn name(&self) -> &str;

    fn platform(&self) -> Platform;

    async fn connect(&mut self) -> Result<(), ChannelError>;

    async fn disconnect(&mut self) -> Result<(), ChannelError>;

    /// Lightweight liveness check, distinct from `connect` (spec §6
    /// Integration contract: connect/disconnect/test_connection/status).
    async fn test_connection(&self) -> Result<(), ChannelError>;

    fn status(&self) -> ChannelStatus;

    /// Runs the platform's ingestion loop, emitting [`Observation`]s onto
    /// `tx` until the adapter is disconnected or the loop errors. Each
    /// integration owns its own ingestion task(s); a single ingest task
    /// consumes the shared channel and applies world-state mutations
    /// under one lock (spec §5 concurrency model).
    async fn run(&mut self, tx: UnboundedSender<Observation>) -> Result<(), ChannelError>;

    /// Sends a message, returning the platform-native message id.
    async fn send_message(&self, msg: &OutboundMessage) -> Result<String, ChannelError>;

    /// Sends a reply. Default delegates to `send_message` since
    /// `OutboundMessage::reply_to` already carries the parent id.
    async fn reply_to_message(&self, msg: &OutboundMessage) -> Result<String, ChannelError> {
        self.send_message(msg).await
    }

    async fn join_room(&self, _channel_id: &str) -> Result<(), ChannelError> {
        Err(ChannelError::NotSupported)
    }

    async fn leave_room(&self, _channel_id: &str) -> Result<(), ChannelError> {
        Err(ChannelError::NotSupported)
    }

    async fn react(&self, _message_id: &str, _emoji: &str) -> Result<(), ChannelError> {
        Err(ChannelError::NotSupported)
    }

    async fn upload_media(&self, _data: &[u8], _mime_type: &str) -> Result<String, ChannelError> {
        Err(ChannelError::NotSupported)
    }

    async fn lookup_profile(&self, _user_id: &str) -> Result<serde_json::Value, ChannelError> {
        Err(ChannelError::NotSupported)
    }

    async fn search(&self, _query: &str) -> Result<Vec<serde_json::Value>, ChannelError> {
        Err(ChannelError::NotSupported)
    }

    async fn notify(&self, _recipient: &str, _content: &str) -> Result<(), ChannelError> {
        Err(ChannelError::NotSupported)
    }

    /// Requests room keys for an event the platform could not decrypt
    /// (spec §4.2 / §9 undecryptable-event retry broadcast). Only
    /// meaningful for encrypted platforms (Matrix); others stay unsupported.
    async fn request_keys(&self, _event_id: &str, _channel_id: &str) -> Result<(), ChannelError> {
        Err(ChannelError::NotSupported)
    }
}
