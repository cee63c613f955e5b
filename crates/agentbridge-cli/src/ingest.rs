use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentbridge_channels::{IntegrationManager, Observation};
use agentbridge_core::types::now_secs;
use agentbridge_nodes::NodeManager;
use agentbridge_world::batching::batch_messages;
use agentbridge_world::types::{Channel, ChannelStatus, Message, PendingInvite};
use agentbridge_world::WorldState;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::history_writer::{HistoryJob, HistoryWriter};

/// The lowercase integration name the encrypted-chat retry worker targets;
/// Matrix is the only platform in this system that can emit undecryptable
/// events (spec §4.2/§9).
const ENCRYPTED_INTEGRATION_NAME: &str = "matrix";

/// Reserved metadata key used to smuggle a message's raw platform payload
/// through the batching buffer; `batch_messages` only ever touches
/// `batched`/`count`, so this survives on the head of a coalesced run and
/// is stripped back out once the batch worker hands the message to history.
const RAW_PAYLOAD_META_KEY: &str = "_raw_payload";

/// Messages buffered since the last flush, awaiting coalescing via
/// [`agentbridge_world::batching::batch_messages`] before they reach
/// [`WorldState::add_message`] (spec §4.1.2: batching "runs at ingest and
/// before `add_message`").
pub type MessageBuffer = Arc<Mutex<Vec<Message>>>;

pub fn message_buffer() -> MessageBuffer {
    Arc::new(Mutex::new(Vec::new()))
}

struct PendingUndecryptable {
    event_id: String,
    channel_id: String,
    sender: String,
}

/// Events seen by the ingest consumer but not yet handed to
/// [`WorldState::record_undecryptable_retry`] — that call doubles as "first
/// retry", so queuing here keeps a freshly ingested event at `retry_count`
/// 0 until the retry worker's next tick (spec §4.2/§9 scenario 6: the
/// record reads `retry_count == 1` only after the first tick, not at
/// ingest).
pub type PendingQueue = Arc<Mutex<Vec<PendingUndecryptable>>>;

pub fn pending_queue() -> PendingQueue {
    Arc::new(Mutex::new(Vec::new()))
}

/// Single consumer applying every registered integration's observations to
/// the world state and durable history under one sequential loop, matching
/// the "single ingest task" concurrency model (spec §5: one writer avoids
/// interleaving world-state mutations from concurrent platform adapters).
pub async fn run_ingestion_consumer(
    mut rx: UnboundedReceiver<Observation>,
    world: Arc<WorldState>,
    nodes: Arc<NodeManager>,
    history: HistoryWriter,
    pending: PendingQueue,
    buffer: MessageBuffer,
) {
    while let Some(observation) = rx.recv().await {
        apply_observation(&observation, &world, &nodes, &history, &pending, &buffer);
    }
    info!("ingestion channel closed, consumer task exiting");
}

fn apply_observation(
    observation: &Observation,
    world: &WorldState,
    nodes: &NodeManager,
    history: &HistoryWriter,
    pending: &PendingQueue,
    buffer: &MessageBuffer,
) {
    match observation {
        Observation::NewMessage(inbound) => {
            let mut metadata = std::collections::HashMap::new();
            if let Some(raw) = &inbound.raw_payload {
                metadata.insert(RAW_PAYLOAD_META_KEY.to_string(), raw.clone());
            }
            let msg = Message {
                id: format!("{}:{}", inbound.channel_id, inbound.timestamp),
                channel_id: inbound.channel_id.clone(),
                platform: inbound.platform,
                sender_id: inbound.sender_id.clone(),
                sender_display: inbound.sender_display.clone(),
                content: inbound.content.clone(),
                timestamp: inbound.timestamp,
                reply_to: inbound.reply_to.clone(),
                media_urls: inbound.media_urls.clone(),
                metadata,
            };
            buffer.lock().unwrap().push(msg);
        }
        Observation::Invite {
            channel_id,
            inviter,
            channel_name,
            topic,
        } => {
            world.add_pending_invite(PendingInvite {
                channel_id: channel_id.clone(),
                inviter: inviter.clone(),
                channel_name: channel_name.clone().unwrap_or_else(|| channel_id.clone()),
                invited_at: now_secs(),
                topic: topic.clone(),
            });
        }
        Observation::MembershipChange {
            channel_id,
            member_count,
        } => {
            if let Some(mut channel) = world.get_channel(channel_id) {
                channel.member_count = *member_count;
                world.upsert_channel(channel);
            } else {
                let mut channel = Channel::new(channel_id.clone(), agentbridge_core::types::Platform::FederatedChat, channel_id.clone());
                channel.member_count = *member_count;
                channel.status = ChannelStatus::Joined;
                world.upsert_channel(channel);
            }
        }
        Observation::Undecryptable {
            event_id,
            channel_id,
            sender,
        } => {
            pending.lock().unwrap().push(PendingUndecryptable {
                event_id: event_id.clone(),
                channel_id: channel_id.clone(),
                sender: sender.clone().unwrap_or_else(|| "unknown".to_string()),
            });
            history.submit(HistoryJob::StateChange {
                change_type: "undecryptable_event".to_string(),
                data: serde_json::json!({"event_id": event_id, "channel_id": channel_id}),
                channel_id: Some(channel_id.clone()),
                platform: None,
                timestamp: now_secs(),
            });
        }
    }
}

/// Periodically retries every tracked undecryptable event plus any newly
/// ingested since the last tick, broadcasting a key request to the owning
/// integration until `max_retries` is exceeded (spec §4.2/§9, scenario 6).
/// Runs independently of the decision cycle.
pub async fn run_undecryptable_retry_worker(
    world: Arc<WorldState>,
    integrations: Arc<IntegrationManager>,
    pending: PendingQueue,
    interval_secs: u64,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;

        let mut due: Vec<(String, String, String)> = world
            .undecryptable_events()
            .into_iter()
            .map(|e| (e.event_id, e.channel_id, e.sender))
            .collect();
        let newly_queued = std::mem::take(&mut *pending.lock().unwrap());
        due.extend(newly_queued.into_iter().map(|p| (p.event_id, p.channel_id, p.sender)));

        if due.is_empty() {
            continue;
        }
        let Some(integration) = integrations.get(ENCRYPTED_INTEGRATION_NAME) else {
            continue;
        };
        for (event_id, channel_id, sender) in due {
            let guard = integration.lock().await;
            if let Err(e) = guard.request_keys(&event_id, &channel_id).await {
                warn!(event_id = %event_id, error = %e, "key-request broadcast failed");
            }
            drop(guard);
            let still_tracked = world.record_undecryptable_retry(&event_id, &channel_id, &sender);
            if !still_tracked {
                info!(event_id = %event_id, "undecryptable event exceeded max_retries, dropped");
            }
        }
    }
}

/// Drains the message buffer on a fixed tick, coalesces same-sender/
/// same-channel rapid-fire fragments with [`batch_messages`], then applies
/// each resulting message to the world exactly as a single ingested
/// observation would have been (spec §4.1.2). `interval_secs` should match
/// `batch_messages`'s own coalescing window so a message is never held
/// back materially longer than the window it was batched within.
pub async fn run_message_batch_worker(
    buffer: MessageBuffer,
    world: Arc<WorldState>,
    nodes: Arc<NodeManager>,
    history: HistoryWriter,
    interval_secs: u64,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;

        let pending = std::mem::take(&mut *buffer.lock().unwrap());
        if pending.is_empty() {
            continue;
        }

        for mut msg in batch_messages(pending) {
            let raw_payload = msg.metadata.remove(RAW_PAYLOAD_META_KEY);
            let channel_id = msg.channel_id.clone();
            let platform = msg.platform;
            let message_id = msg.id.clone();
            let sender_id = msg.sender_id.clone();
            let content = msg.content.clone();
            let timestamp = msg.timestamp;
            let reply_to = msg.reply_to.clone();

            let accepted = world.add_message(msg);
            if accepted {
                nodes.refresh_summary(&format!("channels.{}.{}", platform.as_str(), channel_id));
                history.submit(HistoryJob::Message {
                    message_id,
                    channel_id,
                    platform: platform.as_str().to_string(),
                    sender_id,
                    content,
                    timestamp,
                    reply_to,
                    raw_payload,
                });
            }
        }
    }
}
